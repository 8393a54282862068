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

//! two-line element sets (TLE). The element fields are decoded by satkit, we add the validation that
//! satkit does not do (line layout, checksums, catalog numbers, epoch vs. fetch time)

use std::fmt;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, TimeDelta, Utc};
use satkit::TLE;
use sattrack_common::datetime::short_utc_datetime_string;

use crate::errors::{malformed, Result};

pub const TLE_LINE_LEN: usize = 69;
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// a validated element set for a single catalog object, together with its provenance.
/// Element sets are immutable - a refresh produces a new one
#[derive(Clone)]
pub struct ElementSet {
    pub catalog_id: u32,
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
    pub epoch: DateTime<Utc>,
    pub fetched: DateTime<Utc>,
    pub source: String,
    tle: TLE,
}

impl ElementSet {
    /// parse and validate a TLE. This fails with `MalformedData` if line format, catalog numbers or
    /// checksums don't match, or if the epoch lies after the fetch time
    pub fn from_lines (name: Option<&str>, line1: &str, line2: &str, fetched: DateTime<Utc>, source: &str)->Result<ElementSet> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();

        check_line( line1, '1')?;
        check_line( line2, '2')?;

        let catalog_id = parse_catalog_number( &line1[2..7])?;
        let id2 = parse_catalog_number( &line2[2..7])?;
        if catalog_id != id2 {
            return Err( malformed!("catalog number mismatch between lines: {} != {}", catalog_id, id2))
        }

        let epoch = parse_epoch( &line1[18..32])?;
        if epoch > fetched {
            return Err( malformed!("epoch {} of object {} after fetch time {}", epoch, catalog_id, fetched))
        }

        let tle = TLE::load_2line( line1, line2).map_err(|e| malformed!("TLE import of object {} failed: {:?}", catalog_id, e))?;
        if !(tle.mean_motion > 0.0) {
            return Err( malformed!("non-positive mean motion for object {}", catalog_id))
        }

        let name = name.map(strip_name).filter(|s| !s.is_empty());

        Ok( ElementSet {
            catalog_id,
            name,
            line1: line1.to_string(),
            line2: line2.to_string(),
            epoch,
            fetched,
            source: source.to_string(),
            tle,
        })
    }

    /// the satkit TLE for propagation. Note that satkit caches its model state in the TLE, which is why
    /// propagation has to work on a (mutable) clone
    pub fn tle (&self)->&TLE {
        &self.tle
    }

    /// revolutions per day
    pub fn mean_motion (&self)->f64 {
        self.tle.mean_motion
    }

    /// degrees
    pub fn inclination (&self)->f64 {
        self.tle.inclination
    }

    pub fn period_minutes (&self)->f64 {
        MINUTES_PER_DAY / self.tle.mean_motion
    }

    /// the same elements with a new fetch timestamp (used when upstream re-delivers an unchanged set)
    pub fn restamped (&self, fetched: DateTime<Utc>)->ElementSet {
        let mut es = self.clone();
        es.fetched = fetched.max(self.epoch);
        es
    }

    pub fn display_name (&self)->String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.catalog_id.to_string()
        }
    }

    pub fn age_at (&self, t: DateTime<Utc>)->TimeDelta {
        t - self.epoch
    }

    /// 3 line (or 2 line if there is no name) text representation
    pub fn to_tle_text (&self)->String {
        match &self.name {
            Some(name) => format!("{}\n{}\n{}\n", name, self.line1, self.line2),
            None => format!("{}\n{}\n", self.line1, self.line2)
        }
    }
}

/// the decoded elements are a pure function of the lines
impl PartialEq for ElementSet {
    fn eq (&self, other: &Self)->bool {
        self.catalog_id == other.catalog_id && self.name == other.name
            && self.line1 == other.line1 && self.line2 == other.line2
            && self.epoch == other.epoch && self.fetched == other.fetched && self.source == other.source
    }
}

impl fmt::Debug for ElementSet {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSet")
            .field("catalog_id", &self.catalog_id)
            .field("name", &self.name)
            .field("line1", &self.line1)
            .field("line2", &self.line2)
            .field("epoch", &self.epoch)
            .field("fetched", &self.fetched)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for ElementSet {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementSet( id:{}, name:{}, epoch:{}, fetched:{}, source:{})",
            self.catalog_id, self.display_name(), short_utc_datetime_string(&self.epoch),
            short_utc_datetime_string(&self.fetched), self.source)
    }
}

/* #region line validation ********************************************************************************/

/// space-track.org prefixes names with "0 "
fn strip_name (name: &str)->String {
    let name = name.trim();
    name.strip_prefix("0 ").unwrap_or(name).trim().to_string()
}

fn check_line (line: &str, line_no: char)->Result<()> {
    if line.len() != TLE_LINE_LEN || !line.is_ascii() {
        return Err( malformed!("line {} has invalid length {} (expected {})", line_no, line.len(), TLE_LINE_LEN))
    }
    if !line.starts_with(line_no) || line.as_bytes()[1] != b' ' {
        return Err( malformed!("line {} does not start with line number: {:?}", line_no, &line[..2]))
    }

    let expected = line.as_bytes()[68].wrapping_sub(b'0') as u32;
    let computed = checksum( &line[..68]);
    if expected != computed {
        return Err( malformed!("line {} checksum mismatch: expected {}, computed {}", line_no, expected, computed))
    }
    Ok(())
}

/// mod-10 checksum over digits, each minus sign counts as 1
pub fn checksum (s: &str)->u32 {
    s.bytes().fold( 0, |acc, b| {
        match b {
            b'0'..=b'9' => acc + (b - b'0') as u32,
            b'-' => acc + 1,
            _ => acc
        }
    }) % 10
}

/// catalog numbers are 5 digits, or "alpha-5" with a leading letter (I and O are skipped) for ids >= 100000
pub fn parse_catalog_number (s: &str)->Result<u32> {
    let s = s.trim();
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() && c != 'I' && c != 'O' => {
            let mut hi = (c as u32) - ('A' as u32) + 10;
            if c > 'I' { hi -= 1 }
            if c > 'O' { hi -= 1 }
            let lo: u32 = chars.as_str().parse().map_err(|_| malformed!("invalid catalog number {:?}", s))?;
            Ok( hi * 10000 + lo)
        }
        _ => s.parse().map_err(|_| malformed!("invalid catalog number {:?}", s))
    }
}

/// YYDDD.DDDDDDDD, two digit years < 57 are in the 21st century
fn parse_epoch (s: &str)->Result<DateTime<Utc>> {
    let yy: i32 = s[..2].trim().parse().map_err(|_| malformed!("invalid epoch year {:?}", s))?;
    let year = if yy < 57 { 2000 + yy } else { 1900 + yy };
    let day: f64 = s[2..].trim().parse().map_err(|_| malformed!("invalid epoch day {:?}", s))?;

    let whole_days = day.floor();
    if !(day >= 1.0) || whole_days > days_in_year(year) as f64 {
        return Err( malformed!("epoch day {} out of range for year {}", day, year))
    }

    let micros = ((day - whole_days) * 86_400_000_000.0).round() as i64;

    let jan1 = Utc.with_ymd_and_hms( year, 1, 1, 0, 0, 0).single().ok_or( malformed!("invalid epoch year {}", year))?;
    Ok( jan1 + TimeDelta::days( whole_days as i64 - 1) + TimeDelta::microseconds(micros))
}

fn days_in_year (year: i32)->u32 {
    match NaiveDate::from_ymd_opt( year, 12, 31) {
        Some(d) => d.ordinal(),
        None => 365
    }
}

/* #endregion line validation */
