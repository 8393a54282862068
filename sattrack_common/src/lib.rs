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
// logging macros refer to this so that client crates don't need their own tracing dependency
pub use tracing;

pub mod macros;
pub mod errors;
pub mod logging;
pub mod fs;
pub mod datetime;
pub mod config;
pub mod cartesian3;

/// normalize angle in degrees to [0..360)
pub fn normalize_360 (deg: f64)->f64 {
    let d = deg % 360.0;
    if d < 0.0 { d + 360.0 } else { d }
}

/// round to given number of decimals
pub fn round_to (x: f64, decimals: i32)->f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}
