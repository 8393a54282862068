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

//! mapping of civil UTC timestamps onto satkit `Instant`s. Instants are in a uniform time scale, which is
//! what we need for time differences (satkit keeps track of leap seconds)

use chrono::{DateTime, TimeZone};
use satkit::Instant;

pub fn instant_from_datetime<Z> (dt: &DateTime<Z>)->Instant where Z: TimeZone {
    Instant::from_unixtime( dt.timestamp_micros() as f64 / 1_000_000.0)
}

/// seconds of uniform time elapsed between two timestamps (negative if `to` is before `from`)
pub fn seconds_between<Z> (from: &DateTime<Z>, to: &DateTime<Z>)->f64 where Z: TimeZone {
    (instant_from_datetime(to) - instant_from_datetime(from)).as_seconds()
}

pub fn minutes_between<Z> (from: &DateTime<Z>, to: &DateTime<Z>)->f64 where Z: TimeZone {
    seconds_between( from, to) / 60.0
}
