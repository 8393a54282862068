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

//! element sources: obtaining validated TLEs from external providers.
//! Sources apply their configured timeout to each request and do not retry - that is up to the caller

use std::{sync::LazyLock, time::Duration};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Serialize,Deserialize};
use tokio::sync::Mutex;
use sattrack_common::{debug, warn};

use crate::elements::ElementSet;
use crate::errors::{malformed, source_unavailable, OrbitalError, Result};

pub const CELESTRAK_GP_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";
pub const SPACETRACK_URL: &str = "https://www.space-track.org";

/// regex to extract TLE lines from space-track.org gp responses - we don't need to parse the whole
/// JSON structures since we only feed the TLE lines into our own parser
pub static TLE_LINES_RE: LazyLock<Regex> = LazyLock::new(||
    Regex::new( r#""TLE_LINE0": *"(.*?)",\s*"TLE_LINE1": *"(.+?)",\s*"TLE_LINE2": *"(.+?)""#).unwrap()
);

/// a provider of element sets for catalog ids
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// short identifier that is stored with the element sets
    fn name (&self)->&str;

    /// fetch the current element set for the catalog id. This is a single attempt that fails with
    /// `SourceUnavailable`, `NotFoundUpstream` or `MalformedData`
    async fn fetch (&self, catalog_id: u32)->Result<ElementSet>;
}

fn http_client (timeout: Duration)->Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| OrbitalError::ConfigInvalid( format!("cannot create http client: {e}")))
}

fn check_catalog_id (es: ElementSet, catalog_id: u32)->Result<ElementSet> {
    if es.catalog_id == catalog_id {
        Ok(es)
    } else {
        Err( malformed!("requested object {} but got {}", catalog_id, es.catalog_id))
    }
}

/* #region celestrak ***************************************************************************************/

/// CelesTrak GP queries in TLE format
pub struct CelestrakSource {
    client: Client,
    endpoint: String,
}

impl CelestrakSource {
    pub fn new (endpoint: impl ToString, timeout: Duration)->Result<Self> {
        Ok( CelestrakSource { client: http_client(timeout)?, endpoint: endpoint.to_string() })
    }

    pub fn endpoint (&self)->&str {
        &self.endpoint
    }
}

#[async_trait]
impl ElementSource for CelestrakSource {
    fn name (&self)->&str { "celestrak" }

    async fn fetch (&self, catalog_id: u32)->Result<ElementSet> {
        debug!("fetching elements for {catalog_id} from {}", self.endpoint);

        let response = self.client
            .get( &self.endpoint)
            .query( &[("CATNR", catalog_id.to_string().as_str()), ("FORMAT", "tle")])
            .send()
            .await.map_err(|e| source_unavailable!("celestrak request for {} failed: {}", catalog_id, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err( OrbitalError::NotFoundUpstream(catalog_id))
        }
        if !status.is_success() {
            return Err( source_unavailable!("celestrak returned {} for {}", status, catalog_id))
        }

        let text = response.text().await.map_err(|e| source_unavailable!("failed to read celestrak response for {}: {}", catalog_id, e))?;
        let text = text.trim();
        if text.is_empty() || text.starts_with("No GP data found") {
            return Err( OrbitalError::NotFoundUpstream(catalog_id))
        }

        let es = parse_tle_text( text, Utc::now(), self.name())?;
        check_catalog_id( es, catalog_id)
    }
}

/* #endregion celestrak */

/* #region space-track *************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone)]
pub struct SpaceTrackCredentials {
    pub identity: String,
    pub password: String
}

/// SpaceTrack cookie
struct SpaceTrackCookie {
    value: String,
    created: DateTime<Utc>,
}

/// space-track.org gp queries. Note the API uses a login cookie with a short expiration that we refresh on demand
pub struct SpaceTrackSource {
    client: Client,
    base_url: String,
    credentials: SpaceTrackCredentials,
    max_cookie_age: Duration,
    cookie: Mutex<Option<SpaceTrackCookie>>,
}

impl SpaceTrackSource {
    pub fn new (base_url: impl ToString, credentials: SpaceTrackCredentials, max_cookie_age: Duration, timeout: Duration)->Result<Self> {
        Ok( SpaceTrackSource {
            client: http_client(timeout)?,
            base_url: base_url.to_string().trim_end_matches('/').to_string(),
            credentials,
            max_cookie_age,
            cookie: Mutex::new(None)
        })
    }

    async fn cookie_value (&self)->Result<String> {
        let mut cookie = self.cookie.lock().await;

        let is_valid = match cookie.as_ref() {
            Some(c) => (Utc::now() - c.created).num_seconds() < self.max_cookie_age.as_secs() as i64,
            None => false
        };
        if !is_valid {
            *cookie = Some( self.login().await?);
        }

        cookie.as_ref().map(|c| c.value.clone()).ok_or( source_unavailable!("no space-track.org cookie"))
    }

    async fn login (&self)->Result<SpaceTrackCookie> {
        let url = format!("{}/ajaxauth/login", self.base_url);

        let response = self.client
            .post( url)
            .form( &self.credentials)
            .send()
            .await.map_err(|e| source_unavailable!("space-track.org login failed: {e}"))?;

        if !response.status().is_success() {
            return Err( source_unavailable!("space-track.org login rejected: {}", response.status()))
        }

        let value = match response.headers().get("Set-Cookie") {
            Some(cookie) => cookie.to_str().map_err(|_| source_unavailable!("invalid space-track.org cookie value"))?,
            None => return Err( source_unavailable!("space-track.org login failed to obtain cookie")),
        };

        Ok( SpaceTrackCookie { value: value.to_string(), created: Utc::now() })
    }

    async fn invalidate_cookie (&self) {
        *self.cookie.lock().await = None;
    }
}

#[async_trait]
impl ElementSource for SpaceTrackSource {
    fn name (&self)->&str { "space-track" }

    async fn fetch (&self, catalog_id: u32)->Result<ElementSet> {
        let cookie = self.cookie_value().await?;
        let url = format!("{}/basicspacedata/query/class/gp/NORAD_CAT_ID/{}/format/json", self.base_url, catalog_id);

        let response = self.client
            .get(url)
            .header("Cookie", cookie)
            .send()
            .await.map_err(|e| source_unavailable!("space-track.org gp query for {} failed: {}", catalog_id, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.invalidate_cookie().await;
            return Err( source_unavailable!("space-track.org session rejected ({})", status))
        }
        if !status.is_success() {
            return Err( source_unavailable!("space-track.org returned {} for {}", status, catalog_id))
        }

        let text = response.text().await.map_err(|e| source_unavailable!("failed to read gp data for {}: {}", catalog_id, e))?;
        let now = Utc::now();

        // gp returns at most one element set per object
        match parse_tle_lines(&text).into_iter().next() {
            Some((l0,l1,l2)) => {
                let es = ElementSet::from_lines( Some(&l0), &l1, &l2, now, self.name())?;
                check_catalog_id( es, catalog_id)
            }
            None => Err( OrbitalError::NotFoundUpstream(catalog_id))
        }
    }
}

/* #endregion space-track */

/* #region text helpers ***********************************************************************************/

/// parse a single 2 or 3 line TLE
pub fn parse_tle_text (text: &str, fetched: DateTime<Utc>, source: &str)->Result<ElementSet> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).filter(|l| !l.trim().is_empty()).collect();
    match lines.len() {
        2 => ElementSet::from_lines( None, lines[0], lines[1], fetched, source),
        3 => ElementSet::from_lines( Some(lines[0]), lines[1], lines[2], fetched, source),
        n => Err( malformed!("response with invalid number of TLE lines: {}", n))
    }
}

/// parse a multi-object TLE catalog (as returned for CelesTrak group queries). Invalid records are
/// logged and skipped
pub fn parse_tle_catalog (text: &str, fetched: DateTime<Utc>, source: &str)->Vec<ElementSet> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).filter(|l| !l.trim().is_empty()).collect();
    let mut list = Vec::new();

    let mut i = 0;
    while i + 1 < lines.len() {
        let (name, l1, l2, n) = if lines[i].starts_with("1 ") {
            (None, lines[i], lines[i+1], 2)
        } else if i + 2 < lines.len() {
            (Some(lines[i]), lines[i+1], lines[i+2], 3)
        } else {
            break
        };

        if l1.starts_with("1 ") && l2.starts_with("2 ") {
            match ElementSet::from_lines( name, l1, l2, fetched, source) {
                Ok(es) => list.push(es),
                Err(e) => warn!("skipping invalid TLE {:?}: {}", name.unwrap_or(l1), e)
            }
            i += n;
        } else {
            i += 1; // resync on the next line
        }
    }

    list
}

pub fn parse_tle_lines (input: &str) -> Vec<(String,String,String)> {
    TLE_LINES_RE.captures_iter(input).map(|caps| {
        ( caps[1].to_string(), caps[2].to_string(), caps[3].to_string() )
    }).collect()
}

/* #endregion text helpers */
