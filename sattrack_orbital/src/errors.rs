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

use thiserror::Error;
use sattrack_common::errors::CommonError;

pub type Result<T> = std::result::Result<T, OrbitalError>;

#[derive(Error,Debug)]
pub enum OrbitalError {

    //--- element source gateway

    #[error("element source unavailable: {0}")]
    SourceUnavailable( String ),

    #[error("no elements upstream for object {0}")]
    NotFoundUpstream( u32 ),

    #[error("malformed element data: {0}")]
    MalformedData( String ),

    //--- element store

    #[error("corrupt cache record: {0}")]
    CacheCorrupt( String ),

    #[error("cache IO error: {0}")]
    CacheIOError( #[from] std::io::Error ),

    #[error("no cached elements for object {0}")]
    NotFound( u32 ),

    //--- propagator

    #[error("propagation diverged: {0}")]
    PropagationDivergence( String ),

    #[error("target time outside extrapolation horizon: {0}")]
    EpochTooFarInPast( String ),

    //--- startup and delivery

    #[error("invalid config: {0}")]
    ConfigInvalid( String ),

    #[error("output sink error: {0}")]
    SinkError( String ),

    #[error("operation cancelled")]
    Cancelled,
}

impl OrbitalError {
    /// only transient upstream failures are worth another attempt
    pub fn is_retryable (&self)->bool {
        matches!( self, OrbitalError::SourceUnavailable(_))
    }
}

impl From<CommonError> for OrbitalError {
    fn from (e: CommonError)->Self {
        OrbitalError::ConfigInvalid( e.to_string())
    }
}

macro_rules! malformed {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OrbitalError::MalformedData( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use malformed;

macro_rules! source_unavailable {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OrbitalError::SourceUnavailable( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use source_unavailable;

macro_rules! diverged {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OrbitalError::PropagationDivergence( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use diverged;

macro_rules! config_invalid {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OrbitalError::ConfigInvalid( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use config_invalid;

macro_rules! sink_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OrbitalError::SinkError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use sink_error;
