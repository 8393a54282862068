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

//! output sinks that receive predictions

use std::path::{Path,PathBuf};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use sattrack_common::{fs::append_line_to_file, info};

use crate::errors::{sink_error, Result};
use crate::passes::PassPrediction;
use crate::propagator::StateVector;
use crate::topocentric::GroundStation;

#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn submit (&self, catalog_id: u32, state: &StateVector)->Result<()>;

    async fn submit_passes (&self, station: &GroundStation, passes: &[PassPrediction])->Result<()>;
}

/// logs predictions
pub struct LogSink;

#[async_trait]
impl OutputSink for LogSink {
    async fn submit (&self, catalog_id: u32, state: &StateVector)->Result<()> {
        info!(catalog_id, degraded = state.degraded, "{}", state);
        for la in &state.look_angles {
            info!(catalog_id, station = %la.station, "az: {:.2}, el: {:.2}, range: {:.1} km, range rate: {:.3} km/s",
                la.azimuth, la.elevation, la.range, la.range_rate);
        }
        Ok(())
    }

    async fn submit_passes (&self, station: &GroundStation, passes: &[PassPrediction])->Result<()> {
        info!(station = %station.name, "{} predicted passes", passes.len());
        for p in passes {
            info!(station = %station.name, "{} ({}): {} - {}, {} s, max elevation {:.2}",
                p.satellite, p.norad_id, p.start_time, p.end_time, p.duration, p.max_elevation);
        }
        Ok(())
    }
}

/// one JSON line per record
#[derive(Serialize)]
#[serde(tag="type", rename_all="snake_case")]
enum JsonLine<'a> {
    State { catalog_id: u32, state: &'a StateVector },
    Pass { pass: &'a PassPrediction },
}

/// appends predictions as JSON lines to a file
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new (path: impl AsRef<Path>)->Self {
        JsonLinesSink { path: path.as_ref().to_path_buf(), lock: Mutex::new(()) }
    }

    pub fn path (&self)->&Path {
        &self.path
    }

    async fn append (&self, lines: Vec<JsonLine<'_>>)->Result<()> {
        let mut text = String::new();
        for line in &lines {
            let s = serde_json::to_string(line).map_err(|e| sink_error!("failed to serialize prediction: {}", e))?;
            if !text.is_empty() { text.push('\n') }
            text.push_str(&s);
        }
        if text.is_empty() { return Ok(()) }

        let _guard = self.lock.lock().await;
        append_line_to_file( &self.path, &text).map_err(|e| sink_error!("failed to write {:?}: {}", self.path, e))
    }
}

#[async_trait]
impl OutputSink for JsonLinesSink {
    async fn submit (&self, catalog_id: u32, state: &StateVector)->Result<()> {
        self.append( vec![ JsonLine::State { catalog_id, state } ]).await
    }

    async fn submit_passes (&self, _station: &GroundStation, passes: &[PassPrediction])->Result<()> {
        self.append( passes.iter().map(|pass| JsonLine::Pass { pass }).collect()).await
    }
}

#[derive(Debug,Clone)]
pub enum SinkMessage {
    State { catalog_id: u32, state: StateVector },
    Passes { station: String, passes: Vec<PassPrediction> },
}

/// forwards predictions to a tokio channel
pub struct ChannelSink {
    tx: mpsc::Sender<SinkMessage>,
}

impl ChannelSink {
    pub fn new (tx: mpsc::Sender<SinkMessage>)->Self {
        ChannelSink { tx }
    }

    pub fn with_capacity (capacity: usize)->(Self, mpsc::Receiver<SinkMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelSink { tx }, rx)
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn submit (&self, catalog_id: u32, state: &StateVector)->Result<()> {
        self.tx.send( SinkMessage::State { catalog_id, state: state.clone() }).await
            .map_err(|_| sink_error!("channel closed"))
    }

    async fn submit_passes (&self, station: &GroundStation, passes: &[PassPrediction])->Result<()> {
        self.tx.send( SinkMessage::Passes { station: station.name.clone(), passes: passes.to_vec() }).await
            .map_err(|_| sink_error!("channel closed"))
    }
}
