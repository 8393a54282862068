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
use serde_json::Value;
use sattrack_orbital::{
    errors::OrbitalError,
    passes::{find_passes, PassPrediction},
    propagator::{Ephemeris, StateVector},
    sink::{ChannelSink, JsonLinesSink, LogSink, OutputSink, SinkMessage},
    topocentric::GroundStation,
};

fn station ()->GroundStation {
    GroundStation::new( "default", 45.0, 2.0, 100.0, 10.0, vec![25544])
}

fn iss_state ()->StateVector {
    let eph = Ephemeris::new( &iss( iss_epoch())).unwrap();
    let mut state = eph.state_vector( iss_epoch() + TimeDelta::minutes(5)).unwrap();
    state.add_look_angle( &station());
    state
}

fn iss_passes ()->Vec<PassPrediction> {
    let eph = Ephemeris::new( &iss( iss_epoch())).unwrap();
    let gs = station();
    find_passes( &eph, &gs, iss_epoch(), iss_epoch() + TimeDelta::hours(14), Duration::from_secs(60)).unwrap()
        .iter().map(|w| PassPrediction::new( "ISS", 25544, 145.8, w, &gs)).collect()
}

#[tokio::test]
async fn test_json_lines_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predictions.jsonl");
    let sink = JsonLinesSink::new( &path);

    let state = iss_state();
    let passes = iss_passes();
    assert_eq!( passes.len(), 2);

    sink.submit( 25544, &state).await.unwrap();
    sink.submit_passes( &station(), &passes).await.unwrap();
    sink.submit_passes( &station(), &[]).await.unwrap();

    let text = std::fs::read_to_string( &path).unwrap();
    let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!( lines.len(), 3);

    assert_eq!( lines[0]["type"], "state");
    assert_eq!( lines[0]["catalog_id"], 25544);
    assert!( (lines[0]["state"]["minutes_since_epoch"].as_f64().unwrap() - 5.0).abs() < 1e-6);
    assert_eq!( lines[0]["state"]["look_angles"][0]["station"], "default");

    let restored: StateVector = serde_json::from_value( lines[0]["state"].clone()).unwrap();
    assert_eq!( restored.time, state.time);

    for (line,pass) in lines[1..].iter().zip( passes.iter()) {
        assert_eq!( line["type"], "pass");
        assert_eq!( line["pass"]["norad_id"], 25544);
        assert_eq!( line["pass"]["duration"], pass.duration);
        assert_eq!( line["pass"]["ground_station"]["name"], "default");
    }
}

#[tokio::test]
async fn test_json_lines_sink_error() {
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonLinesSink::new( dir.path().join("no_such_dir").join("predictions.jsonl"));
    assert!( matches!( sink.submit( 25544, &iss_state()).await, Err(OrbitalError::SinkError(_))));
}

#[tokio::test]
async fn test_channel_sink() {
    let (sink, mut rx) = ChannelSink::with_capacity(4);
    let state = iss_state();

    sink.submit( 25544, &state).await.unwrap();
    sink.submit_passes( &station(), &iss_passes()).await.unwrap();

    match rx.recv().await {
        Some(SinkMessage::State{ catalog_id, state: s }) => { assert_eq!( catalog_id, 25544); assert_eq!( s, state) }
        other => panic!("unexpected message {other:?}")
    }
    match rx.recv().await {
        Some(SinkMessage::Passes{ station, passes }) => { assert_eq!( station, "default"); assert_eq!( passes.len(), 2) }
        other => panic!("unexpected message {other:?}")
    }

    drop(rx);
    assert!( matches!( sink.submit( 25544, &state).await, Err(OrbitalError::SinkError(_))));
}

#[tokio::test]
async fn test_log_sink() {
    let sink = LogSink;
    assert!( sink.submit( 25544, &iss_state()).await.is_ok());
    assert!( sink.submit_passes( &station(), &iss_passes()).await.is_ok());
}
