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

//! predictor configuration. Durations are given as human readable strings ("30s", "6h", "30 days")

use std::{collections::HashSet, path::{Path,PathBuf}, sync::Arc, time::Duration};
use serde::{Serialize,Deserialize};
use sattrack_common::{
    config::load_config,
    datetime::{deserialize_duration, serialize_duration},
};

use crate::errors::{config_invalid, Result};
use crate::gateway::{CelestrakSource, ElementSource, SpaceTrackCredentials, SpaceTrackSource, CELESTRAK_GP_URL, SPACETRACK_URL};
use crate::orchestrator::RetryPolicy;
use crate::sink::{JsonLinesSink, LogSink, OutputSink};
use crate::topocentric::GroundStation;

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "/config/config.yml";

/// a tracked object (satellite) and its scheduling policy
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct TrackedObject {
    pub id: u32,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default="default_poll_interval", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub poll_interval: Duration,

    #[serde(default="default_max_staleness", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub max_staleness: Duration,

    #[serde(default="default_extrapolation_horizon", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub extrapolation_horizon: Duration,

    /// offset from the cycle time for which we propagate
    #[serde(default, deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub lookahead: Duration,

    /// downlink frequency [MHz]
    #[serde(default="default_frequency")]
    pub frequency: f64,
}

fn default_poll_interval ()->Duration { Duration::from_secs(60) }
fn default_max_staleness ()->Duration { Duration::from_secs(6 * 3600) }
fn default_extrapolation_horizon ()->Duration { Duration::from_secs(30 * 86400) }
fn default_frequency ()->f64 { 137.5 }

impl TrackedObject {
    pub fn new (id: u32, name: Option<&str>)->Self {
        TrackedObject {
            id,
            name: name.map(|s| s.to_string()),
            poll_interval: default_poll_interval(),
            max_staleness: default_max_staleness(),
            extrapolation_horizon: default_extrapolation_horizon(),
            lookahead: Duration::ZERO,
            frequency: default_frequency(),
        }
    }

    pub fn display_name (&self)->String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug,Clone,Copy,Serialize,Deserialize,PartialEq,Default)]
#[serde(rename_all="snake_case")]
pub enum SourceKind {
    #[default]
    Celestrak,
    SpaceTrack,
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// provider URL, defaults to the public endpoint of the provider
    #[serde(default)]
    pub endpoint: Option<String>,

    /// required for space-track.org
    #[serde(default)]
    pub credentials: Option<SpaceTrackCredentials>,

    #[serde(default="default_max_cookie_age", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub max_cookie_age: Duration,
}

fn default_max_cookie_age ()->Duration { Duration::from_secs(3600) }

impl Default for SourceConfig {
    fn default ()->Self {
        SourceConfig { kind: SourceKind::Celestrak, endpoint: None, credentials: None, max_cookie_age: default_max_cookie_age() }
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct RetryConfig {
    #[serde(default="default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default="default_initial_backoff", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub initial_backoff: Duration,

    #[serde(default="default_max_backoff", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub max_backoff: Duration,
}

fn default_max_attempts ()->u32 { 3 }
fn default_initial_backoff ()->Duration { Duration::from_secs(2) }
fn default_max_backoff ()->Duration { Duration::from_secs(60) }

impl Default for RetryConfig {
    fn default ()->Self {
        RetryConfig { max_attempts: default_max_attempts(), initial_backoff: default_initial_backoff(), max_backoff: default_max_backoff() }
    }
}

#[derive(Debug,Clone,Copy,Serialize,Deserialize,PartialEq,Default)]
#[serde(rename_all="snake_case")]
pub enum OutputKind {
    #[default]
    Log,
    JsonLines,
}

#[derive(Debug,Clone,Serialize,Deserialize,Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub kind: OutputKind,

    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct PredictionConfig {
    #[serde(default="default_prediction_days")]
    pub prediction_days: u32,

    /// sampling step of the pass search
    #[serde(default="default_time_step", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub time_step: Duration,

    /// how often we re-plan passes
    #[serde(default="default_prediction_interval", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub interval: Duration,
}

fn default_prediction_days ()->u32 { 3 }
fn default_time_step ()->Duration { Duration::from_secs(60) }
fn default_prediction_interval ()->Duration { Duration::from_secs(6 * 3600) }

impl Default for PredictionConfig {
    fn default ()->Self {
        PredictionConfig { prediction_days: default_prediction_days(), time_step: default_time_step(), interval: default_prediction_interval() }
    }
}

impl PredictionConfig {
    pub fn window (&self)->Duration {
        Duration::from_secs( self.prediction_days as u64 * 86400)
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct PredictorConfig {
    #[serde(default="default_cache_directory")]
    pub cache_directory: PathBuf,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default="default_fetch_timeout", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub fetch_timeout: Duration,

    #[serde(default)]
    pub retry: RetryConfig,

    /// how long superseded element sets are kept in the cache
    #[serde(default="default_retention", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub retention: Duration,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub prediction: PredictionConfig,

    pub satellites: Vec<TrackedObject>,

    #[serde(default)]
    pub ground_stations: Vec<GroundStation>,
}

fn default_cache_directory ()->PathBuf { PathBuf::from("/data") }
fn default_fetch_timeout ()->Duration { Duration::from_secs(30) }
fn default_retention ()->Duration { Duration::from_secs(30 * 86400) }

impl PredictorConfig {
    /// check constraints that serde can't express. Violations are `ConfigInvalid`
    pub fn validate (&self)->Result<()> {
        if self.satellites.is_empty() {
            return Err( config_invalid!("no satellites configured"))
        }

        let mut ids = HashSet::new();
        for obj in &self.satellites {
            if !ids.insert(obj.id) {
                return Err( config_invalid!("duplicate satellite id {}", obj.id))
            }
            if obj.poll_interval.is_zero() {
                return Err( config_invalid!("poll_interval of satellite {} has to be positive", obj.id))
            }
            if obj.max_staleness.is_zero() {
                return Err( config_invalid!("max_staleness of satellite {} has to be positive", obj.id))
            }
            if obj.extrapolation_horizon.is_zero() {
                return Err( config_invalid!("extrapolation_horizon of satellite {} has to be positive", obj.id))
            }
            if !obj.frequency.is_finite() || obj.frequency < 0.0 {
                return Err( config_invalid!("invalid frequency {} for satellite {}", obj.frequency, obj.id))
            }
        }

        let mut names = HashSet::new();
        for gs in &self.ground_stations {
            if !names.insert(gs.name.as_str()) {
                return Err( config_invalid!("duplicate ground station {}", gs.name))
            }
            if !(-90.0..=90.0).contains(&gs.latitude) || !(-180.0..=180.0).contains(&gs.longitude) {
                return Err( config_invalid!("invalid position of ground station {}: {}, {}", gs.name, gs.latitude, gs.longitude))
            }
            if !(-90.0..90.0).contains(&gs.minimum_elevation) {
                return Err( config_invalid!("invalid minimum_elevation of ground station {}: {}", gs.name, gs.minimum_elevation))
            }
            if let Some(id) = gs.satellites.iter().find(|id| !ids.contains(*id)) {
                return Err( config_invalid!("ground station {} references unknown satellite {}", gs.name, id))
            }
        }

        if self.fetch_timeout.is_zero() {
            return Err( config_invalid!("fetch_timeout has to be positive"))
        }
        if self.retry.max_attempts == 0 {
            return Err( config_invalid!("retry.max_attempts has to be at least 1"))
        }
        if self.prediction.prediction_days == 0 || self.prediction.time_step.is_zero() || self.prediction.interval.is_zero() {
            return Err( config_invalid!("prediction_days, time_step and interval have to be positive"))
        }
        if self.output.kind == OutputKind::JsonLines && self.output.path.is_none() {
            return Err( config_invalid!("json_lines output requires a path"))
        }
        if self.source.kind == SourceKind::SpaceTrack && self.source.credentials.is_none() {
            return Err( config_invalid!("space_track source requires credentials"))
        }

        Ok(())
    }

    pub fn retry_policy (&self)->RetryPolicy {
        RetryPolicy::new( self.retry.max_attempts, self.retry.initial_backoff, self.retry.max_backoff)
    }

    pub fn create_source (&self)->Result<Arc<dyn ElementSource>> {
        let src = &self.source;
        match src.kind {
            SourceKind::Celestrak => {
                let endpoint = src.endpoint.as_deref().unwrap_or(CELESTRAK_GP_URL);
                Ok( Arc::new( CelestrakSource::new( endpoint, self.fetch_timeout)?))
            }
            SourceKind::SpaceTrack => {
                let endpoint = src.endpoint.as_deref().unwrap_or(SPACETRACK_URL);
                let credentials = src.credentials.clone().ok_or( config_invalid!("space_track source requires credentials"))?;
                Ok( Arc::new( SpaceTrackSource::new( endpoint, credentials, src.max_cookie_age, self.fetch_timeout)?))
            }
        }
    }

    pub fn create_sink (&self)->Result<Arc<dyn OutputSink>> {
        match (self.output.kind, &self.output.path) {
            (OutputKind::Log, _) => Ok( Arc::new( LogSink)),
            (OutputKind::JsonLines, Some(path)) => Ok( Arc::new( JsonLinesSink::new(path))),
            (OutputKind::JsonLines, None) => Err( config_invalid!("json_lines output requires a path"))
        }
    }
}

/// explicit path if given, then $CONFIG_PATH, then the default location
pub fn config_path (explicit: Option<&str>)->PathBuf {
    match explicit {
        Some(path) => PathBuf::from(path),
        None => match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_PATH)
        }
    }
}

/// load (YAML or RON, by extension) and validate the predictor config
pub fn load_predictor_config (path: impl AsRef<Path>)->Result<PredictorConfig> {
    let config: PredictorConfig = load_config( path)?;
    config.validate()?;
    Ok(config)
}
