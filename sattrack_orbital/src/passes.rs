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

//! rise/culmination/set events of objects above the minimum elevation of a ground station

use std::time::Duration;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Serialize,Deserialize};
use sattrack_common::{datetime::to_time_delta, round_to};

use crate::errors::Result;
use crate::propagator::Ephemeris;
use crate::topocentric::GroundStation;

const REFINE_RESOLUTION_MS: i64 = 1000;
const GOLDEN_RATIO: f64 = 0.618_033_988_749_895; // (sqrt(5)-1)/2

/// the raw result of the event search
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct PassWindow {
    pub rise: DateTime<Utc>,
    pub culmination: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub max_elevation: f64,
}

#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct StationInfo {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl From<&GroundStation> for StationInfo {
    fn from (gs: &GroundStation)->Self {
        StationInfo { name: gs.name.clone(), latitude: gs.latitude, longitude: gs.longitude, altitude: gs.altitude }
    }
}

/// a complete pass of an object over a ground station, as handed to the output sink
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct PassPrediction {
    pub satellite: String,
    pub norad_id: u32,
    pub frequency: f64, // [MHz]
    pub start_time: DateTime<Utc>,
    pub max_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64, // [s]
    pub max_elevation: f64, // [deg]
    pub ground_station: StationInfo,
}

impl PassPrediction {
    pub fn new (satellite: impl ToString, norad_id: u32, frequency: f64, window: &PassWindow, station: &GroundStation)->Self {
        PassPrediction {
            satellite: satellite.to_string(),
            norad_id,
            frequency,
            start_time: window.rise,
            max_time: window.culmination,
            end_time: window.set,
            duration: (window.set - window.rise).num_seconds(),
            max_elevation: round_to( window.max_elevation, 2),
            ground_station: StationInfo::from(station),
        }
    }
}

/// find all complete passes within [t_start,t_end]. The elevation is sampled with `step` (which has to be
/// shorter than the shortest pass of interest), rise and set are then refined by bisection and the
/// culmination by golden section search. Passes that are already in progress at `t_start` or still in
/// progress at `t_end` are not reported
pub fn find_passes (eph: &Ephemeris, station: &GroundStation, t_start: DateTime<Utc>, t_end: DateTime<Utc>, step: Duration)->Result<Vec<PassWindow>> {
    let min_el = station.minimum_elevation;
    let elevation = |t: &DateTime<Utc>| -> Result<f64> {
        let (pos,_) = eph.teme(t)?;
        Ok( station.elevation( t, &pos))
    };

    let step = to_time_delta(step).max( TimeDelta::seconds(1));

    // the coarse grid is propagated as one batch
    let mut grid: Vec<DateTime<Utc>> = Vec::new();
    let mut t = t_start;
    while t < t_end {
        grid.push(t);
        t += step;
    }
    grid.push(t_end);

    let above: Vec<bool> = eph.teme_many( &grid)?.iter().zip( &grid)
        .map( |((pos,_),t)| station.elevation( t, pos) > min_el)
        .collect();

    let mut passes: Vec<PassWindow> = Vec::new();
    let mut rise: Option<DateTime<Utc>> = None;

    for i in 1..grid.len() {
        let (t_prev, t) = (grid[i-1], grid[i]);

        if above[i] && !above[i-1] {
            rise = Some( refine_crossing( &elevation, min_el, t_prev, t, true)?);

        } else if !above[i] && above[i-1] {
            if let Some(t_rise) = rise.take() {
                let t_set = refine_crossing( &elevation, min_el, t_prev, t, false)?;
                let (culmination, max_elevation) = find_culmination( &elevation, t_rise, t_set)?;
                if max_elevation > min_el {
                    passes.push( PassWindow { rise: t_rise, culmination, set: t_set, max_elevation });
                }
            }
        }
    }

    Ok(passes)
}

/// bisect the threshold crossing within [t0,t1] down to the refine resolution
fn refine_crossing<F> (elevation: &F, threshold: f64, t0: DateTime<Utc>, t1: DateTime<Utc>, rising: bool)->Result<DateTime<Utc>>
    where F: Fn(&DateTime<Utc>)->Result<f64>
{
    let mut lo = t0;
    let mut hi = t1;

    while (hi - lo).num_milliseconds() > REFINE_RESOLUTION_MS {
        let mid = lo + (hi - lo) / 2;
        let above = elevation(&mid)? > threshold;
        if above == rising { hi = mid } else { lo = mid }
    }

    // the reported time is the first (rise) or last (set) one above the threshold
    Ok( if rising { hi } else { lo } )
}

/// golden section search for the maximum elevation within [t0,t1]
fn find_culmination<F> (elevation: &F, t0: DateTime<Utc>, t1: DateTime<Utc>)->Result<(DateTime<Utc>,f64)>
    where F: Fn(&DateTime<Utc>)->Result<f64>
{
    let at = |x: f64| t0 + TimeDelta::milliseconds( x.round() as i64);

    let mut a = 0.0;
    let mut b = (t1 - t0).num_milliseconds() as f64;
    let mut c = b - GOLDEN_RATIO * (b - a);
    let mut d = a + GOLDEN_RATIO * (b - a);
    let mut fc = elevation(&at(c))?;
    let mut fd = elevation(&at(d))?;

    while b - a > REFINE_RESOLUTION_MS as f64 {
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - GOLDEN_RATIO * (b - a);
            fc = elevation(&at(c))?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + GOLDEN_RATIO * (b - a);
            fd = elevation(&at(d))?;
        }
    }

    let t = at( (a + b) / 2.0);
    Ok( (t, elevation(&t)?) )
}
