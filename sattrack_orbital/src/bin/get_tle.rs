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
use sattrack_common::{check_cli, define_cli, logging::init_tracing};
use sattrack_orbital::{config::{config_path, load_predictor_config}, ElementStore};

define_cli! { ARGS [about="fetch TLEs for the given catalog ids into the element cache"] =
    config: Option<String> [help="pathname of config file (default: $CONFIG_PATH or /config/config.yml)", long, short],
    ids: Vec<u32> [help="NORAD catalog ids (default: all configured satellites)"]
}

#[tokio::main]
async fn main() -> Result<()> {
    check_cli!(ARGS);
    init_tracing();

    let config = load_predictor_config( config_path( ARGS.config.as_deref()))?;
    let store = ElementStore::open_dir( &config.cache_directory)?;
    let source = config.create_source()?;

    let ids: Vec<u32> = if ARGS.ids.is_empty() {
        config.satellites.iter().map(|o| o.id).collect()
    } else {
        ARGS.ids.clone()
    };

    for id in ids {
        match source.fetch(id).await {
            Ok(es) => {
                store.put(&es)?;
                println!("{es}");
                print!("{}", es.to_tle_text());
            }
            Err(e) => eprintln!("failed to fetch {id}: {e}")
        }
    }

    Ok(())
}
