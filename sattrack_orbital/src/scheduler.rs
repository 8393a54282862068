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

//! drives the orchestrator: one task per tracked object running on its own poll interval, plus one task that
//! plans passes and prunes the cache. Tasks can be triggered on demand and are stopped through the cancel token

use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::Notify, task::JoinSet};
use tokio_util::sync::CancellationToken;
use sattrack_common::{datetime::utc_now, debug, info, warn};

use crate::config::{PredictionConfig, TrackedObject};
use crate::orchestrator::Orchestrator;

/// handle to trigger or stop a running scheduler
#[derive(Clone)]
pub struct SchedulerHandle {
    object_triggers: Arc<HashMap<u32,Arc<Notify>>>,
    pass_trigger: Arc<Notify>,
    cancel: CancellationToken,
}

impl SchedulerHandle {
    /// run a cycle for the object now, without waiting for its poll interval. Returns false for unknown ids
    pub fn trigger (&self, catalog_id: u32)->bool {
        match self.object_triggers.get(&catalog_id) {
            Some(notify) => { notify.notify_one(); true }
            None => false
        }
    }

    pub fn trigger_all (&self) {
        for notify in self.object_triggers.values() { notify.notify_one() }
    }

    pub fn trigger_passes (&self) {
        self.pass_trigger.notify_one()
    }

    pub fn shutdown (&self) {
        self.cancel.cancel()
    }

    pub fn is_shut_down (&self)->bool {
        self.cancel.is_cancelled()
    }
}

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    objects: Vec<TrackedObject>,
    prediction: PredictionConfig,
    retention: Duration,
    handle: SchedulerHandle,
}

impl Scheduler {
    /// the orchestrator's cancel token also stops the scheduler
    pub fn new (orchestrator: Arc<Orchestrator>, objects: Vec<TrackedObject>, prediction: PredictionConfig, retention: Duration)->Self {
        let object_triggers: HashMap<u32,Arc<Notify>> = objects.iter().map(|o| (o.id, Arc::new(Notify::new()))).collect();
        let handle = SchedulerHandle {
            object_triggers: Arc::new(object_triggers),
            pass_trigger: Arc::new(Notify::new()),
            cancel: orchestrator.cancel_token().clone(),
        };

        Scheduler { orchestrator, objects, prediction, retention, handle }
    }

    pub fn handle (&self)->SchedulerHandle {
        self.handle.clone()
    }

    /// spawn all tasks and wait until they are cancelled
    pub async fn run (self) {
        let mut tasks = JoinSet::new();

        for obj in self.objects.iter().cloned() {
            let orchestrator = self.orchestrator.clone();
            let cancel = self.handle.cancel.clone();
            if let Some(trigger) = self.handle.object_triggers.get(&obj.id).cloned() {
                tasks.spawn( run_object_loop( orchestrator, obj, trigger, cancel));
            }
        }

        if !self.orchestrator.stations().is_empty() {
            tasks.spawn( run_pass_loop(
                self.orchestrator.clone(), self.objects.clone(), self.prediction.clone(), self.retention,
                self.handle.pass_trigger.clone(), self.handle.cancel.clone()
            ));
        } else {
            tasks.spawn( run_prune_loop( self.orchestrator.clone(), self.prediction.interval, self.retention, self.handle.cancel.clone()));
        }

        info!("scheduler started with {} tasks", tasks.len());
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                warn!("scheduler task terminated abnormally: {e}");
            }
        }
        info!("scheduler terminated");
    }
}

/// wait for the next poll, an on-demand trigger or cancellation. Returns false if we got cancelled
async fn wait_for_next (interval: Duration, trigger: &Notify, cancel: &CancellationToken)->bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
        _ = trigger.notified() => true
    }
}

async fn run_object_loop (orchestrator: Arc<Orchestrator>, obj: TrackedObject, trigger: Arc<Notify>, cancel: CancellationToken) {
    debug!("starting cycle loop for {} every {:?}", obj.display_name(), obj.poll_interval);
    loop {
        if cancel.is_cancelled() { break }
        let report = orchestrator.run_cycle( &obj, utc_now()).await;
        debug!("{report}");

        if !wait_for_next( obj.poll_interval, &trigger, &cancel).await { break }
    }
    debug!("cycle loop for {} terminated", obj.display_name());
}

async fn run_pass_loop (orchestrator: Arc<Orchestrator>, objects: Vec<TrackedObject>, prediction: PredictionConfig, retention: Duration,
                        trigger: Arc<Notify>, cancel: CancellationToken) {
    loop {
        if cancel.is_cancelled() { break }
        let now = utc_now();
        orchestrator.plan_all_passes( &objects, now, &prediction).await;
        prune( &orchestrator, retention);

        if !wait_for_next( prediction.interval, &trigger, &cancel).await { break }
    }
}

async fn run_prune_loop (orchestrator: Arc<Orchestrator>, interval: Duration, retention: Duration, cancel: CancellationToken) {
    let trigger = Notify::new(); // never notified
    loop {
        prune( &orchestrator, retention);
        if !wait_for_next( interval, &trigger, &cancel).await { break }
    }
}

fn prune (orchestrator: &Orchestrator, retention: Duration) {
    match orchestrator.store().prune( utc_now(), retention) {
        Ok(n) => if n > 0 { info!("pruned {n} superseded cache records") },
        Err(e) => warn!("cache pruning failed: {e}")
    }
}
