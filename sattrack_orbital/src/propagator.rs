/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! turning element sets into state vectors at given times

use std::time::Duration;
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Serialize,Deserialize};
use sattrack_common::{cartesian3::Cartesian3, datetime::{short_utc_datetime_string, to_time_delta}};

use satkit::{TLE, sgp4::{sgp4, SGP4Error}};

use crate::elements::ElementSet;
use crate::errors::{diverged, OrbitalError, Result};
use crate::timescale::{instant_from_datetime, minutes_between};
use crate::topocentric::{teme_to_ecef_position, GeodeticPosition, GroundStation, LookAngle};

/// orbits with longer periods need the deep space (SDP4) perturbations
pub const MAX_NEAR_EARTH_PERIOD_MINUTES: f64 = 225.0;

/// position and velocity of a tracked object at a given time
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct StateVector {
    pub catalog_id: u32,
    pub name: Option<String>,
    pub time: DateTime<Utc>,

    pub position: Cartesian3, // TEME [km]
    pub velocity: Cartesian3, // TEME [km/s]
    pub subpoint: GeodeticPosition,

    pub epoch: DateTime<Utc>,
    pub source: String,
    pub minutes_since_epoch: f64,

    /// elements were older than the staleness limit because the source could not be reached
    pub degraded: bool,

    #[serde(default, skip_serializing_if="Vec::is_empty")]
    pub look_angles: Vec<LookAngle>,
}

impl StateVector {
    pub fn radius (&self)->f64 {
        self.position.length()
    }

    pub fn speed (&self)->f64 {
        self.velocity.length()
    }

    pub fn add_look_angle (&mut self, station: &GroundStation) {
        let la = station.look_angle( &self.time, &self.position.to_vector(), &self.velocity.to_vector());
        self.look_angles.push( la);
    }
}

impl std::fmt::Display for StateVector {
    fn fmt (&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StateVector( id:{}, t:{}, pos:{} km, vel:{} km/s, lat:{:.3}, lon:{:.3}, alt:{:.1} km{})",
            self.catalog_id, short_utc_datetime_string(&self.time), self.position, self.velocity,
            self.subpoint.latitude, self.subpoint.longitude, self.subpoint.altitude,
            if self.degraded { ", degraded" } else { "" })
    }
}

/// stateless SGP4 propagator with an extrapolation horizon. Propagating further than the horizon away from
/// the element set epoch (in either direction) is rejected
#[derive(Debug,Clone,Copy)]
pub struct Propagator {
    horizon: Duration,
}

impl Propagator {
    pub fn new (horizon: Duration)->Self {
        Propagator { horizon }
    }

    pub fn horizon (&self)->Duration {
        self.horizon
    }

    pub fn check_horizon (&self, es: &ElementSet, t: &DateTime<Utc>)->Result<()> {
        let dt = (*t - es.epoch).abs();
        if dt > to_time_delta( self.horizon) {
            Err( OrbitalError::EpochTooFarInPast( format!("{} is {} days from epoch {} of object {} (horizon {} days)",
                short_utc_datetime_string(t), dt.num_days(), short_utc_datetime_string(&es.epoch),
                es.catalog_id, self.horizon.as_secs() / 86400)))
        } else {
            Ok(())
        }
    }

    pub fn propagate (&self, es: &ElementSet, t: DateTime<Utc>)->Result<StateVector> {
        self.check_horizon( es, &t)?;
        Ephemeris::new( es)?.state_vector( t)
    }

    /// propagate one element set for a number of times, initializing the model only once
    pub fn propagate_many (&self, es: &ElementSet, times: &[DateTime<Utc>])->Result<Vec<StateVector>> {
        for t in times {
            self.check_horizon( es, t)?;
        }
        let eph = Ephemeris::new( es)?;
        let states = eph.teme_many( times)?;
        Ok( times.iter().zip( states).map( |(t,(pos,vel))| eph.to_state_vector( *t, &pos, &vel)).collect() )
    }

    /// an initialized model that can be evaluated within [t_start,t_end]
    pub fn ephemeris (&self, es: &ElementSet, t_start: &DateTime<Utc>, t_end: &DateTime<Utc>)->Result<Ephemeris> {
        self.check_horizon( es, t_start)?;
        self.check_horizon( es, t_end)?;
        Ephemeris::new( es)
    }
}

/// SGP4 model bound to the element set it was initialized from
#[derive(Clone)]
pub struct Ephemeris {
    es: ElementSet,
    tle: TLE, // with initialized model state
}

impl Ephemeris {
    pub fn new (es: &ElementSet)->Result<Ephemeris> {
        let period = es.period_minutes();
        if period >= MAX_NEAR_EARTH_PERIOD_MINUTES {
            return Err( diverged!("object {} has deep space orbit (period {:.1} min)", es.catalog_id, period))
        }

        // the first evaluation initializes the model, which is then kept in the TLE
        let mut tle = es.tle().clone();
        let tvec = vec![ tle.epoch ];
        let (_, _, errs) = sgp4( &mut tle, &tvec);
        check_sgp4_result( es.catalog_id, errs.first())?;

        Ok( Ephemeris { es: es.clone(), tle })
    }

    pub fn element_set (&self)->&ElementSet {
        &self.es
    }

    /// TEME position [km] and velocity [km/s]
    pub fn teme (&self, t: &DateTime<Utc>)->Result<(Vector3<f64>,Vector3<f64>)> {
        let mut states = self.teme_many( std::slice::from_ref(t))?;
        states.pop().ok_or_else(|| diverged!("no state for object {}", self.es.catalog_id))
    }

    /// TEME positions [km] and velocities [km/s] for a batch of times, in one model run
    pub fn teme_many (&self, times: &[DateTime<Utc>])->Result<Vec<(Vector3<f64>,Vector3<f64>)>> {
        let tvec: Vec<_> = times.iter().map(instant_from_datetime).collect();
        let (pteme, vteme, errs) = sgp4( &mut self.tle.clone(), &tvec); // sgp4 mutates the TLE

        let mut states = Vec::with_capacity( times.len());
        for i in 0..times.len() {
            check_sgp4_result( self.es.catalog_id, errs.get(i))?;

            let pos = Vector3::new( pteme[(0,i)], pteme[(1,i)], pteme[(2,i)]) / 1000.0;
            let vel = Vector3::new( vteme[(0,i)], vteme[(1,i)], vteme[(2,i)]) / 1000.0;
            if !(pos.iter().all(|x| x.is_finite()) && vel.iter().all(|x| x.is_finite())) {
                return Err( diverged!("non-finite state for object {} at {}", self.es.catalog_id, short_utc_datetime_string(&times[i])))
            }
            states.push( (pos, vel));
        }
        Ok(states)
    }

    pub fn state_vector (&self, t: DateTime<Utc>)->Result<StateVector> {
        let (pos, vel) = self.teme( &t)?;
        Ok( self.to_state_vector( t, &pos, &vel))
    }

    fn to_state_vector (&self, t: DateTime<Utc>, pos: &Vector3<f64>, vel: &Vector3<f64>)->StateVector {
        let subpoint = GeodeticPosition::from_ecef_km( &teme_to_ecef_position( &t, pos));

        StateVector {
            catalog_id: self.es.catalog_id,
            name: self.es.name.clone(),
            time: t,
            position: Cartesian3::from_vector( pos),
            velocity: Cartesian3::from_vector( vel),
            subpoint,
            epoch: self.es.epoch,
            source: self.es.source.clone(),
            minutes_since_epoch: minutes_between( &self.es.epoch, &t),
            degraded: false,
            look_angles: Vec::new(),
        }
    }
}

/// map satkit's SGP4 error codes (eccentricity, mean motion, semi-latus rectum out of range or decayed orbit)
fn check_sgp4_result (catalog_id: u32, err: Option<&SGP4Error>)->Result<()> {
    match err {
        Some(SGP4Error::SGP4Success) => Ok(()),
        Some(e) => Err( diverged!("SGP4 failed for object {}: {:?}", catalog_id, e)),
        None => Err( diverged!("no SGP4 result for object {}", catalog_id))
    }
}
