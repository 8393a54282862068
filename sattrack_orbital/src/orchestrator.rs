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

//! the prediction cycle for tracked objects: make sure we have fresh elements, propagate, and emit.
//! Each object is processed independently - failures of one object never stop the others

use std::{fmt, sync::Arc, time::Duration};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use sattrack_common::{datetime::to_time_delta, debug, info, warn, error};

use crate::config::{PredictionConfig, TrackedObject};
use crate::elements::ElementSet;
use crate::errors::{OrbitalError, Result};
use crate::gateway::ElementSource;
use crate::passes::{find_passes, PassPrediction};
use crate::propagator::{Propagator, StateVector};
use crate::sink::OutputSink;
use crate::store::ElementStore;
use crate::topocentric::GroundStation;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum CyclePhase {
    Idle,
    CheckFreshness,
    FetchIfStale,
    Propagate,
    Emit,
    Failed,
}

/// where the elements used in a cycle came from
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ElementOrigin {
    /// cached and within the staleness limit
    Cache,
    /// fetched in this cycle
    Fetched,
    /// stale cached elements used because the source failed
    Degraded,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Emitted { origin: ElementOrigin },
    Failed( OrbitalError ),
}

/// what happened in a single cycle of a tracked object
#[derive(Debug)]
pub struct CycleReport {
    pub catalog_id: u32,
    pub time: DateTime<Utc>,
    pub phases: Vec<CyclePhase>,
    pub fetch_attempts: u32,
    pub outcome: CycleOutcome,
    pub state: Option<StateVector>,
}

impl CycleReport {
    fn new (catalog_id: u32, time: DateTime<Utc>)->Self {
        CycleReport { catalog_id, time, phases: vec![CyclePhase::Idle], fetch_attempts: 0, outcome: CycleOutcome::Failed(OrbitalError::Cancelled), state: None }
    }

    fn enter (&mut self, phase: CyclePhase) {
        self.phases.push(phase)
    }

    fn fail (mut self, e: OrbitalError)->Self {
        self.phases.push( CyclePhase::Failed);
        self.outcome = CycleOutcome::Failed(e);
        self
    }

    pub fn is_success (&self)->bool {
        matches!( self.outcome, CycleOutcome::Emitted{..})
    }

    pub fn visited (&self, phase: CyclePhase)->bool {
        self.phases.contains(&phase)
    }

    pub fn error (&self)->Option<&OrbitalError> {
        match &self.outcome {
            CycleOutcome::Failed(e) => Some(e),
            _ => None
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CycleOutcome::Emitted{origin} => write!(f, "cycle {} ok ({:?}, {} fetch attempts)", self.catalog_id, origin, self.fetch_attempts),
            CycleOutcome::Failed(e) => write!(f, "cycle {} failed after {:?}: {}", self.catalog_id, self.phases, e),
        }
    }
}

/// exponential backoff for source fetches. Only `SourceUnavailable` errors are retried
#[derive(Debug,Clone,Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new (max_attempts: u32, initial_backoff: Duration, max_backoff: Duration)->Self {
        RetryPolicy { max_attempts: max_attempts.max(1), initial_backoff, max_backoff }
    }

    pub fn no_retry ()->Self {
        RetryPolicy::new( 1, Duration::ZERO, Duration::ZERO)
    }

    /// delay after the given (1-based) failed attempt
    pub fn backoff (&self, attempt: u32)->Duration {
        let factor = 2u32.saturating_pow( attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default ()->Self {
        RetryPolicy::new( 3, Duration::from_secs(2), Duration::from_secs(60))
    }
}

pub struct Orchestrator {
    store: Arc<ElementStore>,
    source: Arc<dyn ElementSource>,
    sink: Arc<dyn OutputSink>,
    retry: RetryPolicy,
    stations: Vec<GroundStation>,
    fetch_locks: DashMap<u32,Arc<Mutex<()>>>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new (store: Arc<ElementStore>, source: Arc<dyn ElementSource>, sink: Arc<dyn OutputSink>, retry: RetryPolicy,
                stations: Vec<GroundStation>, cancel: CancellationToken)->Self {
        Orchestrator { store, source, sink, retry, stations, fetch_locks: DashMap::new(), cancel }
    }

    pub fn store (&self)->&Arc<ElementStore> { &self.store }

    pub fn stations (&self)->&[GroundStation] { &self.stations }

    pub fn cancel_token (&self)->&CancellationToken { &self.cancel }

    /// run one IDLE -> CHECK_FRESHNESS -> (FETCH_IF_STALE) -> PROPAGATE -> EMIT cycle for a tracked object
    pub async fn run_cycle (&self, obj: &TrackedObject, now: DateTime<Utc>)->CycleReport {
        let mut report = CycleReport::new( obj.id, now);
        let target = now + to_time_delta(obj.lookahead);

        let (es, origin) = match self.acquire_elements( obj, now, target, &mut report).await {
            Ok(res) => res,
            Err(e) => {
                error!("no usable elements for {}: {}", obj.display_name(), e);
                return report.fail(e)
            }
        };

        report.enter( CyclePhase::Propagate);
        let mut state = match Propagator::new( obj.extrapolation_horizon).propagate( &es, target) {
            Ok(state) => state,
            Err(e) => {
                error!("propagation of {} failed: {}", obj.display_name(), e);
                return report.fail(e)
            }
        };
        state.degraded = origin == ElementOrigin::Degraded;
        for station in self.stations.iter().filter(|s| s.observes(obj.id)) {
            state.add_look_angle( station);
        }

        report.enter( CyclePhase::Emit);
        if let Err(e) = self.sink.submit( obj.id, &state).await {
            error!("failed to emit state of {}: {}", obj.display_name(), e);
            return report.fail(e)
        }

        report.enter( CyclePhase::Idle);
        report.outcome = CycleOutcome::Emitted { origin };
        report.state = Some(state);
        report
    }

    /// run cycles for all objects. A failing object does not affect the others
    pub async fn run_all (&self, objects: &[TrackedObject], now: DateTime<Utc>)->Vec<CycleReport> {
        let mut reports = Vec::with_capacity( objects.len());
        for obj in objects {
            let report = self.run_cycle( obj, now).await;
            debug!("{report}");
            reports.push( report);
        }
        reports
    }

    /// get elements for the object that are not stale, fetching them if required. Falls back to stale cached
    /// elements if the source fails and the target time is within the extrapolation horizon
    pub async fn ensure_elements (&self, obj: &TrackedObject, now: DateTime<Utc>)->Result<(ElementSet,ElementOrigin)> {
        let mut report = CycleReport::new( obj.id, now);
        let target = now + to_time_delta(obj.lookahead);
        self.acquire_elements( obj, now, target, &mut report).await
    }

    async fn acquire_elements (&self, obj: &TrackedObject, now: DateTime<Utc>, target: DateTime<Utc>, report: &mut CycleReport)->Result<(ElementSet,ElementOrigin)> {
        let id = obj.id;

        report.enter( CyclePhase::CheckFreshness);
        if !self.store.is_stale( id, now, obj.max_staleness) {
            if let Ok(es) = self.store.get(id) {
                return Ok( (es, ElementOrigin::Cache) )
            }
        }

        report.enter( CyclePhase::FetchIfStale);
        let lock = self.fetch_locks.entry(id).or_default().clone();
        let _guard = lock.lock().await;

        // somebody else might have fetched while we were waiting for the lock
        if !self.store.is_stale( id, now, obj.max_staleness) {
            if let Ok(es) = self.store.get(id) {
                return Ok( (es, ElementOrigin::Cache) )
            }
        }

        match self.fetch_with_retry( id, report).await {
            Ok(es) => {
                if let Err(e) = self.store.put(&es) {
                    warn!("failed to store elements for {}: {}", id, e);
                }
                info!("fetched {}", es);
                Ok( (es, ElementOrigin::Fetched) )
            }
            Err(OrbitalError::Cancelled) => Err(OrbitalError::Cancelled),
            Err(e) => {
                match self.store.get(id) {
                    Ok(es) => {
                        let propagator = Propagator::new( obj.extrapolation_horizon);
                        match propagator.check_horizon( &es, &target) {
                            Ok(()) => {
                                warn!("fetching {} failed ({}), using stale elements from {}", id, e, es.epoch);
                                Ok( (es, ElementOrigin::Degraded) )
                            }
                            Err(he) => {
                                warn!("cached elements for {} not usable: {}", id, he);
                                Err(e)
                            }
                        }
                    }
                    Err(_) => Err(e)
                }
            }
        }
    }

    async fn fetch_with_retry (&self, catalog_id: u32, report: &mut CycleReport)->Result<ElementSet> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            report.fetch_attempts = attempt;

            let res = tokio::select! {
                _ = self.cancel.cancelled() => Err(OrbitalError::Cancelled),
                res = self.source.fetch(catalog_id) => res
            };

            match res {
                Ok(es) => return Ok(es),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!("fetch attempt {} for {} failed: {}, retrying in {:?}", attempt, catalog_id, e, delay);
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(OrbitalError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e)
            }
        }
    }

    /// predict passes of the station's objects within the configured window and hand them to the sink.
    /// Objects without usable elements are logged and skipped
    pub async fn plan_passes (&self, station: &GroundStation, objects: &[TrackedObject], now: DateTime<Utc>, prediction: &PredictionConfig)->Result<Vec<PassPrediction>> {
        let t_end = now + to_time_delta( prediction.window());
        let mut passes: Vec<PassPrediction> = Vec::new();

        for obj in objects.iter().filter(|o| station.observes(o.id)) {
            let (es, _) = match self.ensure_elements( obj, now).await {
                Ok(res) => res,
                Err(OrbitalError::Cancelled) => return Err(OrbitalError::Cancelled),
                Err(e) => {
                    warn!("no elements for {} at {}: {}", obj.display_name(), station.name, e);
                    continue
                }
            };

            let name = obj.name.clone().unwrap_or_else(|| es.display_name());
            let res = Propagator::new( obj.extrapolation_horizon).ephemeris( &es, &now, &t_end)
                .and_then(|eph| find_passes( &eph, station, now, t_end, prediction.time_step));

            match res {
                Ok(windows) => {
                    debug!("{} passes of {} over {}", windows.len(), name, station.name);
                    passes.extend( windows.iter().map(|w| PassPrediction::new( &name, obj.id, obj.frequency, w, station)));
                }
                Err(e) => warn!("failed to predict passes for {} at {}: {}", name, station.name, e)
            }
        }

        passes.sort_by(|a,b| a.start_time.cmp(&b.start_time));
        info!("predicted {} passes for ground station {}", passes.len(), station.name);

        self.sink.submit_passes( station, &passes).await?;
        Ok(passes)
    }

    /// plan passes for all configured ground stations
    pub async fn plan_all_passes (&self, objects: &[TrackedObject], now: DateTime<Utc>, prediction: &PredictionConfig)->Vec<PassPrediction> {
        let mut all = Vec::new();
        for station in &self.stations {
            match self.plan_passes( station, objects, now, prediction).await {
                Ok(passes) => all.extend(passes),
                Err(e) => error!("pass planning for {} failed: {}", station.name, e)
            }
        }
        all.sort_by(|a,b| a.start_time.cmp(&b.start_time));
        all
    }
}
