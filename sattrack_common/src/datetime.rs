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

use chrono::{DateTime, TimeDelta, SecondsFormat, Utc};
use serde::{Deserialize,Serializer,Deserializer};
use std::time::Duration;
use parse_duration::parse;

pub fn utc_now()->DateTime<Utc> {
    Utc::now()
}

/// std Duration to chrono TimeDelta (saturating for durations that don't fit)
pub fn to_time_delta (dur: Duration)->TimeDelta {
    TimeDelta::from_std(dur).unwrap_or(TimeDelta::MAX)
}

pub fn short_utc_datetime_string (dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

//--- durations in configs are human readable strings such as "30s", "6h" or "30 days"

pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> Result<S::Ok, S::Error>  {
    let dfm = format!("{}s", dur.as_secs_f64());
    s.serialize_str(&dfm)
}

//--- misc string format parsing

pub fn parse_datetime (s: &str)->Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.to_utc()),
        Err(_) => None
    }
}

pub fn parse_optional_datetime_or<F> (date_str: &Option<String>, f: F)->DateTime<Utc> where F: FnOnce()->DateTime<Utc> {
    if let Some(date) = date_str.as_ref().and_then(|s| parse_datetime(s)) {
        return date
    }
    f()
}
