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

use std::{collections::VecDeque, sync::{Arc, Mutex, atomic::{AtomicU32, Ordering}}};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use sattrack_orbital::{elements::{checksum, ElementSet}, errors::{OrbitalError, Result}, gateway::ElementSource};

/* #region test-data *************************************************************/

pub const ISS_NAME: &str = "ISS (ZARYA)";
pub const ISS_LINE1: &str = "1 25544U 98067A   24001.00000000  .00016717  00000-0  30270-3 0  9994";
pub const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.50377579432085";
/// same elements, one day later
pub const ISS_LINE1_DAY2: &str = "1 25544U 98067A   24002.00000000  .00016717  00000-0  30270-3 0  9995";

pub const NOAA21_NAME: &str = "0 NOAA 21";
pub const NOAA21_LINE1: &str = "1 54234U 22150A   25076.92835707  .00000366  00000-0  19403-3 0  9994";
pub const NOAA21_LINE2: &str = "2 54234  98.7204  17.0432 0002710  72.7407 287.4066 14.19556514121811";

/// a 12h orbit, i.e. deep space
pub const GPS_LINE1: &str = "1 28474U 04045A   24001.50000000 -.00000027  00000-0  00000+0 0  9999";
pub const GPS_LINE2: &str = "2 28474  54.8000 100.0000 0123000 250.0000 110.0000  2.00563000141776";

/* #endregion test-data */

pub fn utc (y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32)->DateTime<Utc> {
    Utc.with_ymd_and_hms( y, mo, d, h, mi, s).unwrap()
}

pub fn iss_epoch ()->DateTime<Utc> {
    utc( 2024, 1, 1, 0, 0, 0)
}

pub fn noaa21_epoch ()->DateTime<Utc> {
    // 25076.92835707
    utc( 2025, 3, 17, 0, 0, 0) + chrono::TimeDelta::microseconds( (0.92835707f64 * 86_400_000_000.0).round() as i64)
}

pub fn iss (fetched: DateTime<Utc>)->ElementSet {
    ElementSet::from_lines( Some(ISS_NAME), ISS_LINE1, ISS_LINE2, fetched, "test").unwrap()
}

pub fn noaa21 (fetched: DateTime<Utc>)->ElementSet {
    ElementSet::from_lines( Some(NOAA21_NAME), NOAA21_LINE1, NOAA21_LINE2, fetched, "test").unwrap()
}

/// scripted element source that counts its calls
pub struct MockSource {
    responses: Mutex<VecDeque<Result<ElementSet>>>,
    default_error: fn(u32)->OrbitalError,
    pub n_calls: AtomicU32,
}

impl MockSource {
    /// answers with the given responses (in order), then with the default error
    pub fn new (responses: Vec<Result<ElementSet>>, default_error: fn(u32)->OrbitalError)->Arc<Self> {
        Arc::new( MockSource { responses: Mutex::new( responses.into()), default_error, n_calls: AtomicU32::new(0) })
    }

    pub fn unavailable ()->Arc<Self> {
        MockSource::new( vec![], |_| OrbitalError::SourceUnavailable("connection refused".into()))
    }

    pub fn calls (&self)->u32 {
        self.n_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElementSource for MockSource {
    fn name (&self)->&str { "mock" }

    async fn fetch (&self, catalog_id: u32)->Result<ElementSet> {
        self.n_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(res) => res,
            None => Err( (self.default_error)(catalog_id))
        }
    }
}

pub fn iss_day2 (fetched: DateTime<Utc>)->ElementSet {
    ElementSet::from_lines( Some(ISS_NAME), ISS_LINE1_DAY2, ISS_LINE2, fetched, "test").unwrap()
}

/// ISS elements re-dated to the given epoch, for tests that run against the wall clock
pub fn iss_with_epoch (epoch: DateTime<Utc>, fetched: DateTime<Utc>)->ElementSet {
    let day = epoch.ordinal() as f64 + epoch.num_seconds_from_midnight() as f64 / 86400.0;
    let head = format!("1 25544U 98067A   {:02}{:012.8}{}", epoch.year() % 100, day, &ISS_LINE1[32..68]);
    let line1 = format!("{}{}", head, checksum(&head));
    ElementSet::from_lines( Some(ISS_NAME), &line1, ISS_LINE2, fetched, "test").unwrap()
}
