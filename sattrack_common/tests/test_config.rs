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

use std::time::Duration;
use serde::Deserialize;
use sattrack_common::config::{parse_config, ConfigFormat};
use sattrack_common::datetime::deserialize_duration;

#[derive(Deserialize,Debug)]
struct TestConfig {
    name: String,
    #[serde(deserialize_with="deserialize_duration")]
    interval: Duration,
    ids: Vec<u32>,
}

#[test]
fn test_yaml_config() {
    let text = r#"
name: weather
interval: 6h
ids: [25544, 54234]
"#;
    let config: TestConfig = parse_config( text, ConfigFormat::Yaml).unwrap();
    assert_eq!( config.name, "weather");
    assert_eq!( config.interval, Duration::from_secs( 6*3600));
    assert_eq!( config.ids, vec![25544, 54234]);
}

#[test]
fn test_ron_config() {
    let text = r#"(
    name: "noaa",
    interval: "30s",
    ids: [ 54234 ],
)"#;
    let config: TestConfig = parse_config( text, ConfigFormat::Ron).unwrap();
    assert_eq!( config.name, "noaa");
    assert_eq!( config.interval, Duration::from_secs(30));
}

#[test]
fn test_config_format_by_extension() {
    assert_eq!( ConfigFormat::for_path("/config/config.yml").unwrap(), ConfigFormat::Yaml);
    assert_eq!( ConfigFormat::for_path("predictor.ron").unwrap(), ConfigFormat::Ron);
    assert!( ConfigFormat::for_path("predictor.toml").is_err());
}

#[test]
fn test_invalid_duration() {
    let text = "name: x\ninterval: soon\nids: []\n";
    let res: Result<TestConfig,_> = parse_config( text, ConfigFormat::Yaml);
    assert!( res.is_err());
}
