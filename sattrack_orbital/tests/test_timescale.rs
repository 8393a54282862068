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

use chrono::{FixedOffset, TimeDelta};
use sattrack_orbital::timescale::{instant_from_datetime, minutes_between, seconds_between};

#[test]
fn test_interval_without_leap_second() {
    let t0 = utc( 2024, 1, 1, 0, 0, 0);
    let t1 = t0 + TimeDelta::minutes(90) + TimeDelta::milliseconds(500);
    assert!( (seconds_between( &t0, &t1) - 5400.5).abs() < 1e-6);
    assert!( (seconds_between( &t1, &t0) + 5400.5).abs() < 1e-6);
    assert!( (minutes_between( &t0, &t1) - 90.008333333).abs() < 1e-8);
}

#[test]
fn test_instant_ordering() {
    let t0 = iss_epoch();
    let t1 = t0 + TimeDelta::microseconds(10);
    assert!( (instant_from_datetime(&t1) - instant_from_datetime(&t0)).as_seconds() > 0.0);
    assert_eq!( seconds_between( &t0, &t0), 0.0);
}

#[test]
fn test_timezone_independent() {
    let t = utc( 2025, 3, 17, 22, 16, 50);
    let local = t.with_timezone( &FixedOffset::east_opt( 2 * 3600).unwrap());
    let later = local + TimeDelta::hours(1);
    assert!( (seconds_between( &local, &later) - 3600.0).abs() < 1e-6);

    let i_utc = instant_from_datetime(&t);
    let i_local = instant_from_datetime(&local);
    assert_eq!( (i_local - i_utc).as_seconds(), 0.0);
}
