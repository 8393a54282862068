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

use std::sync::Arc;
use anyhow::Result;
use tokio_util::sync::CancellationToken;
use sattrack_common::{check_cli, datetime::utc_now, define_cli, error, info, logging::init_tracing};
use sattrack_orbital::{config::{config_path, load_predictor_config}, ElementStore, Orchestrator, scheduler::Scheduler};

define_cli! { ARGS [about="TLE caching and orbit prediction service"] =
    config: Option<String> [help="pathname of config file (default: $CONFIG_PATH or /config/config.yml)", long, short],
    once: bool [help="run a single prediction cycle for all objects and stations, then exit", long]
}

#[tokio::main]
async fn main() -> Result<()> {
    check_cli!(ARGS);
    init_tracing();

    let path = config_path( ARGS.config.as_deref());
    let config = match load_predictor_config( &path) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load config from {:?}: {}", path, e);
            return Err(e.into())
        }
    };
    info!("loaded config {:?} with {} satellites and {} ground stations", path, config.satellites.len(), config.ground_stations.len());

    let store = match ElementStore::open_dir( &config.cache_directory) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("cache directory {:?} not usable: {}", config.cache_directory, e);
            return Err(e.into())
        }
    };

    let cancel = CancellationToken::new();
    let orchestrator = Arc::new( Orchestrator::new(
        store, config.create_source()?, config.create_sink()?, config.retry_policy(), config.ground_stations.clone(), cancel.clone()
    ));

    if ARGS.once {
        let now = utc_now();
        let reports = orchestrator.run_all( &config.satellites, now).await;
        let n_ok = reports.iter().filter(|r| r.is_success()).count();
        info!("{}/{} objects predicted", n_ok, reports.len());
        orchestrator.plan_all_passes( &config.satellites, now, &config.prediction).await;
        return Ok(())
    }

    let scheduler = Scheduler::new( orchestrator, config.satellites.clone(), config.prediction.clone(), config.retention);
    let handle = scheduler.handle();
    tokio::spawn( async move {
        wait_for_shutdown_signal().await;
        info!("shutting down");
        handle.shutdown();
    });

    scheduler.run().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal () {
    use tokio::signal::unix::{signal, SignalKind};

    match signal( SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = sigterm.recv() => {}
            }
        }
        Err(_) => { let _ = tokio::signal::ctrl_c().await; }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal () {
    let _ = tokio::signal::ctrl_c().await;
}
