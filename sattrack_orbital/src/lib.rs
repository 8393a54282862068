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

//! TLE caching and SGP4 based orbit prediction for tracked objects. Element decoding, propagation and
//! frame transformations are done with satkit

pub mod errors;
pub mod elements;
pub mod timescale;
pub mod propagator;
pub mod topocentric;
pub mod passes;
pub mod store;
pub mod gateway;
pub mod sink;
pub mod config;
pub mod orchestrator;
pub mod scheduler;

pub use errors::{OrbitalError, Result};
pub use elements::ElementSet;
pub use propagator::{Propagator, StateVector};
pub use store::ElementStore;
pub use gateway::ElementSource;
pub use sink::OutputSink;
pub use config::{PredictorConfig, TrackedObject, load_predictor_config};
pub use orchestrator::{Orchestrator, CycleReport, CyclePhase, CycleOutcome, RetryPolicy};
