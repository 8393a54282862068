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

use std::fs;
use regex::Regex;
use sattrack_common::fs::{ensure_writable_dir, filepath_contents_as_string, matching_files_in_dir, remove_file_if_exists, store_atomically};

// run with "cargo test test_xx -- --nocapture"

#[test]
fn test_store_atomically_replaces_contents() {
    let dir = tempfile::tempdir().unwrap();

    let path = store_atomically( &dir.path(), "record.json", b"first").unwrap();
    assert_eq!( filepath_contents_as_string(&path).unwrap(), "first");

    let path = store_atomically( &dir.path(), "record.json", b"second").unwrap();
    assert_eq!( filepath_contents_as_string(&path).unwrap(), "second");

    // no temp files left behind
    let fnames: Vec<String> = fs::read_dir(dir.path()).unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    println!("{fnames:?}");
    assert_eq!( fnames, vec!["record.json".to_string()]);
}

#[test]
fn test_store_atomically_failure_leaves_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_atomically( &dir.path(), "record.json", b"first").unwrap();

    // the target name is taken by a directory, so persisting the temp file fails
    fs::create_dir( dir.path().join("blocked")).unwrap();
    fs::write( dir.path().join("blocked").join("x"), b"-").unwrap();
    assert!( store_atomically( &dir.path(), "blocked", b"second").is_err());

    assert_eq!( filepath_contents_as_string(&path).unwrap(), "first");
    assert_eq!( fs::read_dir(dir.path()).unwrap().count(), 2); // record.json and blocked, no temp file
}

#[test]
fn test_ensure_writable_dir_creates_missing() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("a").join("b");

    assert!( ensure_writable_dir(&sub).is_ok());
    assert!( sub.is_dir());
    assert_eq!( fs::read_dir(&sub).unwrap().count(), 0); // check file removed
}

#[test]
fn test_matching_files() {
    let dir = tempfile::tempdir().unwrap();
    store_atomically( &dir.path(), "25544_2024-01-01_000000.000.json", b"{}").unwrap();
    store_atomically( &dir.path(), "notes.txt", b"-").unwrap();

    let re = Regex::new( r"^\d+_.*\.json$").unwrap();
    let files = matching_files_in_dir( &dir.path(), &re).unwrap();
    assert_eq!( files.len(), 1);

    assert!( remove_file_if_exists( &files[0]).unwrap());
    assert!( !remove_file_if_exists( &files[0]).unwrap());
}
