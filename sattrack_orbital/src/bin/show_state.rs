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

use anyhow::Result;
use sattrack_common::{check_cli, datetime::{parse_optional_datetime_or, utc_now}, define_cli, logging::init_tracing};
use sattrack_orbital::{config::{config_path, load_predictor_config}, ElementStore, Propagator, TrackedObject};

define_cli! { ARGS [about="propagate the cached TLE of a satellite to a given time"] =
    config: Option<String> [help="pathname of config file (default: $CONFIG_PATH or /config/config.yml)", long, short],
    date: Option<String> [help="RFC 3339 datetime (default: now)", long, short],
    json: bool [help="print state as JSON", long],
    satellite: u32 [help="NORAD catalog id"]
}

#[tokio::main]
async fn main() -> Result<()> {
    check_cli!(ARGS);
    init_tracing();

    let config = load_predictor_config( config_path( ARGS.config.as_deref()))?;
    let store = ElementStore::open_dir( &config.cache_directory)?;

    let id = ARGS.satellite;
    let obj = config.satellites.iter().find(|o| o.id == id).cloned().unwrap_or_else(|| TrackedObject::new(id, None));
    let date = parse_optional_datetime_or( &ARGS.date, || utc_now());

    let es = store.get(id)?;
    let mut state = Propagator::new( obj.extrapolation_horizon).propagate( &es, date)?;
    for station in config.ground_stations.iter().filter(|s| s.observes(id)) {
        state.add_look_angle( station);
    }

    if ARGS.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{es}");
        println!("{state}");
        for la in &state.look_angles {
            println!("  {}: az {:.2}, el {:.2}, range {:.1} km, range rate {:.3} km/s", la.station, la.azimuth, la.elevation, la.range, la.range_rate);
        }
    }

    Ok(())
}
