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

#![allow(unused)]

mod common;
use common::*;

use std::time::Duration;
use chrono::TimeDelta;
use nalgebra::Vector3;
use sattrack_orbital::{
    elements::ElementSet, errors::OrbitalError, propagator::{Ephemeris, Propagator, MAX_NEAR_EARTH_PERIOD_MINUTES}
};

/// satellite 00005 of the Vallado et al. SGP4 verification set
const VANGUARD_LINE1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
const VANGUARD_LINE2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

fn vanguard ()->ElementSet {
    ElementSet::from_lines( None, VANGUARD_LINE1, VANGUARD_LINE2, utc( 2000, 6, 28, 0, 0, 0), "test").unwrap()
}

fn assert_close (v: &Vector3<f64>, x: f64, y: f64, z: f64, eps: f64) {
    assert!( (v.x - x).abs() < eps, "x: {} != {}", v.x, x);
    assert!( (v.y - y).abs() < eps, "y: {} != {}", v.y, y);
    assert!( (v.z - z).abs() < eps, "z: {} != {}", v.z, z);
}

#[test]
fn test_verification_values() {
    let es = vanguard();
    assert!( es.period_minutes() < MAX_NEAR_EARTH_PERIOD_MINUTES);

    let eph = Ephemeris::new( &es).unwrap();

    let (pos, vel) = eph.teme( &es.epoch).unwrap();
    println!("t=0: {pos:?} {vel:?}");
    assert_close( &pos, 7022.465291, -1400.082967, 0.039952, 0.01);
    assert_close( &vel, 1.893841, 6.405894, 4.534807, 1e-4);

    let (pos, _) = eph.teme( &(es.epoch + TimeDelta::minutes(360))).unwrap();
    println!("t=360: {pos:?}");
    assert_close( &pos, -7154.031200, -3783.176824, -3536.194122, 0.01);

    let (pos, _) = eph.teme( &(es.epoch + TimeDelta::minutes(720))).unwrap();
    println!("t=720: {pos:?}");
    assert_close( &pos, -7134.593399, 6531.686411, 3260.271864, 0.01);
}

#[test]
fn test_batch_matches_single() {
    let es = vanguard();
    let eph = Ephemeris::new( &es).unwrap();
    let times: Vec<_> = (0..5).map(|i| es.epoch + TimeDelta::minutes( i * 90)).collect();

    let batch = eph.teme_many( &times).unwrap();
    assert_eq!( batch.len(), times.len());
    for (t, (pos,vel)) in times.iter().zip( batch.iter()) {
        let (p1, v1) = eph.teme( t).unwrap();
        assert!( (p1 - pos).norm() < 1e-6);
        assert!( (v1 - vel).norm() < 1e-9);
    }
}

#[test]
fn test_iss_at_epoch() {
    let es = iss( iss_epoch());
    let eph = Ephemeris::new( &es).unwrap();
    assert_eq!( eph.element_set(), &es);

    let state = eph.state_vector( iss_epoch()).unwrap();
    println!("{state}");
    assert!( state.minutes_since_epoch.abs() < 1e-6);
    assert_eq!( state.epoch, es.epoch);
    assert!( (state.radius() - 6782.97).abs() < 0.5);
    assert!( (state.speed() - 7.6689).abs() < 1e-2);
    assert!( state.subpoint.latitude.abs() <= 51.7);
    assert!( state.subpoint.altitude > 400.0 && state.subpoint.altitude < 430.0);
}

#[test]
fn test_iss_two_hours_after_epoch() {
    let es = iss( iss_epoch());
    let t = iss_epoch() + TimeDelta::minutes(120);
    let state = Propagator::new( Duration::from_secs(6 * 3600)).propagate( &es, t).unwrap();

    assert!( (state.minutes_since_epoch - 120.0).abs() < 1e-6);
    assert!( (state.radius() - 6794.81).abs() < 0.5);
    assert!( !state.degraded);
}

#[test]
fn test_noaa21_at_epoch() {
    let es = noaa21( noaa21_epoch());
    let state = Propagator::new( Duration::from_secs(86400)).propagate( &es, noaa21_epoch()).unwrap();

    assert!( state.minutes_since_epoch.abs() < 1e-6);
    assert!( (state.radius() - 7207.32).abs() < 0.5);
}

#[test]
fn test_deterministic() {
    let es = iss( iss_epoch());
    let p = Propagator::new( Duration::from_secs(86400));
    let t = iss_epoch() + TimeDelta::seconds(12345);

    let s1 = p.propagate( &es, t).unwrap();
    let s2 = p.propagate( &es, t).unwrap();
    assert_eq!( s1, s2);

    let many = p.propagate_many( &es, &[t, t + TimeDelta::minutes(1)]).unwrap();
    assert_eq!( many.len(), 2);
    assert_eq!( many[0], s1);
}

#[test]
fn test_backwards_propagation() {
    let es = iss( iss_epoch());
    let t = iss_epoch() - TimeDelta::hours(1);
    let state = Propagator::new( Duration::from_secs(86400)).propagate( &es, t).unwrap();
    assert!( (state.minutes_since_epoch + 60.0).abs() < 1e-6);
    assert!( state.radius() > 6700.0 && state.radius() < 6850.0);
}

#[test]
fn test_horizon() {
    let es = iss( iss_epoch());
    let p = Propagator::new( Duration::from_secs(30 * 86400));

    let res = p.propagate( &es, iss_epoch() + TimeDelta::days(400));
    assert!( matches!( res, Err(OrbitalError::EpochTooFarInPast(_))));

    let res = p.propagate( &es, iss_epoch() - TimeDelta::days(31));
    assert!( matches!( res, Err(OrbitalError::EpochTooFarInPast(_))));

    assert!( p.check_horizon( &es, &(iss_epoch() + TimeDelta::days(30))).is_ok());

    // one bad time fails the whole batch
    let res = p.propagate_many( &es, &[iss_epoch(), iss_epoch() + TimeDelta::days(31)]);
    assert!( matches!( res, Err(OrbitalError::EpochTooFarInPast(_))));
}

#[test]
fn test_deep_space_rejected() {
    let es = ElementSet::from_lines( Some("GPS"), GPS_LINE1, GPS_LINE2, utc( 2024, 1, 2, 0, 0, 0), "test").unwrap();
    assert!( es.period_minutes() > MAX_NEAR_EARTH_PERIOD_MINUTES);

    assert!( matches!( Ephemeris::new( &es), Err(OrbitalError::PropagationDivergence(_))));
    let res = Propagator::new( Duration::from_secs(86400)).propagate( &es, es.epoch);
    assert!( matches!( res, Err(OrbitalError::PropagationDivergence(_))));
}
