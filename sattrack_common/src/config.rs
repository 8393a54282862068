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

//! config file support. We accept RON (our native format) and YAML (what most container deployments
//! mount as config maps). The format is selected by the file extension

use std::path::Path;
use serde::de::DeserializeOwned;

use crate::errors::{CommonError,Result};
use crate::fs::{extension,filepath_contents_as_string};

#[derive(Debug,Clone,Copy,PartialEq)]
pub enum ConfigFormat { Ron, Yaml }

impl ConfigFormat {
    pub fn for_path (path: impl AsRef<Path>)->Result<ConfigFormat> {
        let path = path.as_ref();
        match extension(&path) {
            Some("ron") => Ok(ConfigFormat::Ron),
            Some("yml") | Some("yaml") => Ok(ConfigFormat::Yaml),
            _ => Err( CommonError::UnsupportedConfigFormat( format!("{path:?}")))
        }
    }
}

/// load and deserialize config from the given file
pub fn load_config<C: DeserializeOwned> (path: impl AsRef<Path>)->Result<C> {
    let path = path.as_ref();
    let format = ConfigFormat::for_path(path)?;
    let text = filepath_contents_as_string(&path)?;
    parse_config( &text, format)
}

pub fn parse_config<C: DeserializeOwned> (text: &str, format: ConfigFormat)->Result<C> {
    match format {
        ConfigFormat::Ron => ron::from_str(text).map_err(|e| CommonError::ConfigFormatError(e.to_string())),
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| CommonError::ConfigFormatError(e.to_string()))
    }
}
