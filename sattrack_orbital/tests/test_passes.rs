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
use chrono::{DateTime, TimeDelta, Utc};
use sattrack_orbital::{
    passes::{find_passes, PassPrediction}, propagator::Ephemeris, topocentric::GroundStation
};

fn assert_near (t: DateTime<Utc>, expected: DateTime<Utc>, tolerance_secs: i64) {
    assert!( (t - expected).num_seconds().abs() <= tolerance_secs, "{t} not within {tolerance_secs}s of {expected}");
}

fn station ()->GroundStation {
    GroundStation::new( "default", 45.0, 2.0, 100.0, 10.0, vec![25544])
}

#[test]
fn test_iss_passes_within_a_day() {
    let eph = Ephemeris::new( &iss( iss_epoch())).unwrap();
    let gs = station();
    let t0 = iss_epoch();
    let t1 = t0 + TimeDelta::days(1);

    let passes = find_passes( &eph, &gs, t0, t1, Duration::from_secs(60)).unwrap();
    for p in &passes { println!("{p:?}") }

    assert_eq!( passes.len(), 5);
    for p in &passes {
        assert!( p.rise < p.culmination && p.culmination < p.set);
        assert!( p.max_elevation > gs.minimum_elevation && p.max_elevation < 90.0);
        assert!( (p.set - p.rise) < TimeDelta::minutes(15));
    }
    for w in passes.windows(2) {
        assert!( w[0].set < w[1].rise);
    }

    let first = &passes[0];
    assert_near( first.rise, utc( 2024, 1, 1, 12, 9, 35), 10);
    assert_near( first.culmination, utc( 2024, 1, 1, 12, 12, 50), 10);
    assert_near( first.set, utc( 2024, 1, 1, 12, 15, 55), 10);
    assert!( (first.max_elevation - 38.70).abs() < 0.1);

    let lowest = passes.iter().map(|p| p.max_elevation).fold( f64::MAX, f64::min);
    assert!( (lowest - 24.75).abs() < 0.1);
}

#[test]
fn test_elevation_at_threshold_crossings() {
    let eph = Ephemeris::new( &iss( iss_epoch())).unwrap();
    let gs = station();
    let passes = find_passes( &eph, &gs, iss_epoch(), iss_epoch() + TimeDelta::hours(14), Duration::from_secs(30)).unwrap();
    assert_eq!( passes.len(), 2);

    for p in &passes {
        let el = |t: &DateTime<Utc>| gs.elevation( t, &eph.teme(t).unwrap().0);
        assert!( el(&p.rise) > 10.0 && el(&(p.rise - TimeDelta::seconds(2))) <= 10.0);
        assert!( el(&p.set) > 10.0 && el(&(p.set + TimeDelta::seconds(2))) <= 10.0);
    }
}

#[test]
fn test_incomplete_passes_are_skipped() {
    let eph = Ephemeris::new( &iss( iss_epoch())).unwrap();
    let gs = station();

    // starts within the first pass, ends within the second
    let t0 = utc( 2024, 1, 1, 12, 12, 0);
    let t1 = utc( 2024, 1, 1, 13, 49, 0);
    let passes = find_passes( &eph, &gs, t0, t1, Duration::from_secs(60)).unwrap();
    assert!( passes.is_empty());
}

#[test]
fn test_high_minimum_elevation() {
    let eph = Ephemeris::new( &iss( iss_epoch())).unwrap();
    let gs = GroundStation::new( "picky", 45.0, 2.0, 100.0, 30.0, vec![25544]);

    let passes = find_passes( &eph, &gs, iss_epoch(), iss_epoch() + TimeDelta::days(1), Duration::from_secs(60)).unwrap();
    assert_eq!( passes.len(), 4); // the 24.7 deg pass is dropped
    assert!( passes.iter().all(|p| p.max_elevation > 30.0));
}

#[test]
fn test_pass_prediction() {
    let eph = Ephemeris::new( &iss( iss_epoch())).unwrap();
    let gs = station();
    let passes = find_passes( &eph, &gs, iss_epoch(), iss_epoch() + TimeDelta::hours(13), Duration::from_secs(60)).unwrap();
    assert_eq!( passes.len(), 1);

    let w = &passes[0];
    let p = PassPrediction::new( "ISS (ZARYA)", 25544, 145.8, w, &gs);
    assert_eq!( p.norad_id, 25544);
    assert_eq!( p.start_time, w.rise);
    assert_eq!( p.max_time, w.culmination);
    assert_eq!( p.end_time, w.set);
    assert_eq!( p.duration, (w.set - w.rise).num_seconds());
    assert_eq!( p.max_elevation, (w.max_elevation * 100.0).round() / 100.0);
    assert_eq!( p.ground_station.name, "default");
    assert_eq!( p.ground_station.latitude, 45.0);

    let json = serde_json::to_string(&p).unwrap();
    println!("{json}");
    assert!( json.contains("\"norad_id\":25544"));
    assert!( json.contains("\"ground_station\":{\"name\":\"default\""));
}
