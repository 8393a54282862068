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

//! the element store (TLE cache). Records are keyed by (catalog id, epoch) and stored as JSON through an
//! injectable backend. The store owns all persisted element sets; clients only get clones

use std::{path::{Path,PathBuf}, sync::LazyLock, time::Duration};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use dashmap::DashMap;
use regex::Regex;
use serde::{Serialize,Deserialize};
use sattrack_common::{
    datetime::to_time_delta,
    fs::{ensure_writable_dir, filename, matching_files_in_dir, remove_file_if_exists, store_atomically},
    debug, warn
};

use crate::elements::ElementSet;
use crate::errors::{OrbitalError, Result};

/// regex to extract catalog id and epoch (to the millisecond) from record file names
/// e.g. 25544_2024-01-01_000000.000.json
pub static RECORD_FNAME_RE: LazyLock<Regex> = LazyLock::new(||
    Regex::new( r"^(\d+)_(\d{4})-(\d{2})-(\d{2})_(\d{2})(\d{2})(\d{2})\.(\d{3})\.json$").unwrap()
);

/// the persisted form of an element set
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct TleRecord {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
    pub epoch: DateTime<Utc>,
    pub fetched: DateTime<Utc>,
    pub source: String,
}

impl From<&ElementSet> for TleRecord {
    fn from (es: &ElementSet)->Self {
        TleRecord {
            name: es.name.clone(),
            line1: es.line1.clone(),
            line2: es.line2.clone(),
            epoch: es.epoch,
            fetched: es.fetched,
            source: es.source.clone()
        }
    }
}

/// record identity. Epochs are truncated to milliseconds
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct RecordKey {
    pub catalog_id: u32,
    pub epoch: DateTime<Utc>,
}

impl RecordKey {
    pub fn new (catalog_id: u32, epoch: DateTime<Utc>)->Self {
        let millis = epoch.timestamp_millis();
        let epoch = DateTime::from_timestamp_millis(millis).unwrap_or(epoch);
        RecordKey { catalog_id, epoch }
    }

    pub fn for_element_set (es: &ElementSet)->Self {
        RecordKey::new( es.catalog_id, es.epoch)
    }

    pub fn filename (&self)->String {
        format!("{}_{}.json", self.catalog_id, self.epoch.format("%Y-%m-%d_%H%M%S%.3f"))
    }

    pub fn from_filename (fname: &str)->Option<RecordKey> {
        let cap = RECORD_FNAME_RE.captures(fname)?;
        let n = |i: usize| cap[i].parse::<u32>().ok();

        let catalog_id = n(1)?;
        let t = Utc.with_ymd_and_hms( n(2)? as i32, n(3)?, n(4)?, n(5)?, n(6)?, n(7)?).single()?;
        Some( RecordKey { catalog_id, epoch: t + TimeDelta::milliseconds( n(8)? as i64) })
    }
}

/// raw record storage. Implementations have to replace records atomically so that concurrent readers
/// see either the old or the new contents
pub trait StoreBackend: Send + Sync {
    fn keys (&self, catalog_id: u32)->Result<Vec<RecordKey>>;
    fn catalog_ids (&self)->Result<Vec<u32>>;
    fn read (&self, key: &RecordKey)->Result<Option<Vec<u8>>>;
    fn write (&self, key: &RecordKey, data: &[u8])->Result<()>;
    fn remove (&self, key: &RecordKey)->Result<bool>;
}

/* #region in-memory backend *******************************************************************************/

#[derive(Default)]
pub struct MemoryBackend {
    records: DashMap<RecordKey,Vec<u8>>,
}

impl MemoryBackend {
    pub fn new ()->Self {
        MemoryBackend { records: DashMap::new() }
    }
}

impl StoreBackend for MemoryBackend {
    fn keys (&self, catalog_id: u32)->Result<Vec<RecordKey>> {
        Ok( self.records.iter().map(|e| *e.key()).filter(|k| k.catalog_id == catalog_id).collect() )
    }

    fn catalog_ids (&self)->Result<Vec<u32>> {
        let mut ids: Vec<u32> = self.records.iter().map(|e| e.key().catalog_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn read (&self, key: &RecordKey)->Result<Option<Vec<u8>>> {
        Ok( self.records.get(key).map(|e| e.value().clone()) )
    }

    fn write (&self, key: &RecordKey, data: &[u8])->Result<()> {
        self.records.insert( *key, data.to_vec());
        Ok(())
    }

    fn remove (&self, key: &RecordKey)->Result<bool> {
        Ok( self.records.remove(key).is_some() )
    }
}

/* #endregion in-memory backend */

/* #region filesystem backend ******************************************************************************/

/// flat cache directory with one JSON file per record
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    /// this fails with `CacheIOError` if the directory cannot be created or is not writable
    pub fn new (dir: impl AsRef<Path>)->Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        ensure_writable_dir( &dir)?;

        Ok( FsBackend { dir })
    }

    pub fn dir (&self)->&Path {
        &self.dir
    }

    pub fn path_of (&self, key: &RecordKey)->PathBuf {
        self.dir.join( key.filename())
    }

    fn all_keys (&self)->Result<Vec<RecordKey>> {
        let paths = matching_files_in_dir( &self.dir, &RECORD_FNAME_RE)?;
        Ok( paths.iter().filter_map(|p| filename(p).and_then(RecordKey::from_filename)).collect() )
    }
}

impl StoreBackend for FsBackend {
    fn keys (&self, catalog_id: u32)->Result<Vec<RecordKey>> {
        Ok( self.all_keys()?.into_iter().filter(|k| k.catalog_id == catalog_id).collect() )
    }

    fn catalog_ids (&self)->Result<Vec<u32>> {
        let mut ids: Vec<u32> = self.all_keys()?.iter().map(|k| k.catalog_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn read (&self, key: &RecordKey)->Result<Option<Vec<u8>>> {
        match std::fs::read( self.path_of(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into())
        }
    }

    fn write (&self, key: &RecordKey, data: &[u8])->Result<()> {
        store_atomically( &self.dir, &key.filename(), data)?;
        Ok(())
    }

    fn remove (&self, key: &RecordKey)->Result<bool> {
        Ok( remove_file_if_exists( self.path_of(key))? )
    }
}

/* #endregion filesystem backend */

/// a cached element set with the policy that decides when it has to be refreshed.
/// Entries are snapshots handed out by the store, they are never written back
#[derive(Debug,Clone)]
pub struct CacheEntry {
    element_set: ElementSet,
    last_fetched: DateTime<Utc>,
    max_age: Duration,
}

impl CacheEntry {
    pub fn element_set (&self)->&ElementSet { &self.element_set }
    pub fn last_fetched (&self)->DateTime<Utc> { self.last_fetched }
    pub fn max_age (&self)->Duration { self.max_age }

    pub fn is_stale (&self, now: DateTime<Utc>)->bool {
        now - self.last_fetched > to_time_delta(self.max_age)
    }
}

/// the element store. Corrupted records are logged and otherwise treated as if they did not exist
pub struct ElementStore {
    backend: Box<dyn StoreBackend>,
}

impl ElementStore {
    pub fn new (backend: impl StoreBackend + 'static)->Self {
        ElementStore { backend: Box::new(backend) }
    }

    pub fn in_memory ()->Self {
        ElementStore::new( MemoryBackend::new())
    }

    /// open (or create) a filesystem cache directory
    pub fn open_dir (dir: impl AsRef<Path>)->Result<Self> {
        Ok( ElementStore::new( FsBackend::new(dir)?) )
    }

    /// the most recent (by epoch) readable element set for the catalog id
    pub fn get (&self, catalog_id: u32)->Result<ElementSet> {
        let mut keys = self.backend.keys(catalog_id)?;
        keys.sort_by(|a,b| b.epoch.cmp(&a.epoch));

        for key in &keys {
            if let Some(es) = self.read_valid(key)? {
                return Ok(es)
            }
        }
        Err( OrbitalError::NotFound(catalog_id))
    }

    /// all readable element sets for the catalog id, sorted by epoch
    pub fn history (&self, catalog_id: u32)->Result<Vec<ElementSet>> {
        let mut keys = self.backend.keys(catalog_id)?;
        keys.sort();

        let mut list = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(es) = self.read_valid(key)? {
                list.push(es)
            }
        }
        Ok(list)
    }

    /// persist an element set. Storing an element set with the epoch of an existing record replaces that record,
    /// keeping the later fetch time
    pub fn put (&self, es: &ElementSet)->Result<()> {
        let key = RecordKey::for_element_set(es);
        let mut rec = TleRecord::from(es);

        if let Some(prev) = self.read_valid(&key)? {
            if prev.fetched > rec.fetched {
                rec.fetched = prev.fetched;
            }
        }

        let data = serde_json::to_vec_pretty(&rec).map_err(|e| OrbitalError::CacheCorrupt( e.to_string()))?;
        self.backend.write( &key, &data)
    }

    /// the latest element set of the catalog id together with its staleness policy
    pub fn entry (&self, catalog_id: u32, max_age: Duration)->Result<CacheEntry> {
        let history = self.history(catalog_id)?;
        let last_fetched = history.iter().map(|es| es.fetched).max();

        match (history.into_iter().last(), last_fetched) {
            (Some(element_set), Some(last_fetched)) => Ok( CacheEntry { element_set, last_fetched, max_age }),
            _ => Err( OrbitalError::NotFound(catalog_id))
        }
    }

    /// true if there is no record for the catalog id or if the latest fetch is older than `max_age`
    pub fn is_stale (&self, catalog_id: u32, now: DateTime<Utc>, max_age: Duration)->bool {
        match self.entry( catalog_id, max_age) {
            Ok(entry) => entry.is_stale(now),
            Err(OrbitalError::NotFound(_)) => true,
            Err(e) => {
                warn!("failed to read cache records for {catalog_id}: {e}");
                true
            }
        }
    }

    /// latest fetch time over all readable records of the catalog id
    pub fn last_fetched (&self, catalog_id: u32)->Option<DateTime<Utc>> {
        self.entry( catalog_id, Duration::ZERO).ok().map(|entry| entry.last_fetched)
    }

    /// ids for which we have at least one readable record
    pub fn catalog_ids (&self)->Result<Vec<u32>> {
        let mut ids = Vec::new();
        for id in self.backend.catalog_ids()? {
            if self.get(id).is_ok() { ids.push(id) }
        }
        Ok(ids)
    }

    /// remove superseded records that were fetched more than `retention` before `now`, and corrupted records.
    /// The most recent readable record of each catalog id is always kept. Returns the number of removed records
    pub fn prune (&self, now: DateTime<Utc>, retention: Duration)->Result<usize> {
        let cutoff = now - to_time_delta(retention);
        let mut n_removed = 0;

        for id in self.backend.catalog_ids()? {
            let latest = self.get(id).ok().map(|es| RecordKey::for_element_set(&es));

            for key in self.backend.keys(id)? {
                if Some(key) == latest { continue }

                let remove = match self.read_valid(&key)? {
                    Some(es) => es.fetched < cutoff,
                    None => true
                };
                if remove && self.backend.remove(&key)? {
                    debug!("pruned cache record {}", key.filename());
                    n_removed += 1;
                }
            }
        }

        Ok(n_removed)
    }

    /// read and validate a record. Missing records yield `None`, corrupted ones are logged and also yield `None`
    fn read_valid (&self, key: &RecordKey)->Result<Option<ElementSet>> {
        match self.backend.read(key)? {
            Some(data) => match decode_record( key, &data) {
                Ok(es) => Ok(Some(es)),
                Err(e) => {
                    warn!("ignoring cache record {}: {}", key.filename(), e);
                    Ok(None)
                }
            },
            None => Ok(None)
        }
    }
}

fn decode_record (key: &RecordKey, data: &[u8])->Result<ElementSet> {
    let rec: TleRecord = serde_json::from_slice(data).map_err(|e| OrbitalError::CacheCorrupt( e.to_string()))?;
    let es = ElementSet::from_lines( rec.name.as_deref(), &rec.line1, &rec.line2, rec.fetched, &rec.source)
        .map_err(|e| OrbitalError::CacheCorrupt( e.to_string()))?;

    if es.epoch != rec.epoch {
        return Err( OrbitalError::CacheCorrupt( format!("epoch {} does not match elements ({})", rec.epoch, es.epoch)))
    }
    if RecordKey::for_element_set(&es) != *key {
        return Err( OrbitalError::CacheCorrupt( format!("record contents do not match key {}", key.filename())))
    }
    Ok(es)
}
