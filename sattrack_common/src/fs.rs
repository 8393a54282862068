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

use std::fs::{self,File,OpenOptions};
use std::io::{self,Read,Write,ErrorKind};
use std::path::{Path,PathBuf};
use regex::Regex;
use tempfile::NamedTempFile;

use crate::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

pub fn filename<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_name().and_then(|ostr| ostr.to_str())
}

pub fn extension<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().extension().and_then(|ostr| ostr.to_str())
}

/// check if dir pathname exists and is writable, try to create dir otherwise.
/// Permission bits are not reliable for unprivileged processes so we try to create a temp file (removed on drop)
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }

    match NamedTempFile::new_in(path) {
        Ok(_) => Ok(()),
        Err(e) => Err(io_error!(e.kind(), "dir {:?} not writable: {}", path, e))
    }
}

pub fn file_contents_as_string (file: &mut fs::File) -> Result<String> {
    let len = file.metadata()?.len();
    let mut contents = String::with_capacity(len as usize);
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

pub fn filepath_contents_as_string <P: AsRef<Path>> (path: &P) -> Result<String> {
    let mut file = File::open(path)?;
    file_contents_as_string( &mut file)
}

pub fn append_open (path: impl AsRef<Path>)->Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(true)
        .open(path.as_ref())
}

pub fn append_line_to_file (path: impl AsRef<Path>, s: &str) -> Result<()> {
    let mut file = append_open( path.as_ref())?;
    writeln!( file, "{s}")
}

pub fn matching_files_in_dir<P: AsRef<Path>> (dir: &P, fname_regex: &Regex) -> Result<Vec<PathBuf>> {
    let dir: &Path = dir.as_ref();
    let mut list: Vec<PathBuf> = Vec::new();

    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            if let Ok(entry) = entry {
                if let Some(fname) = entry.file_name().to_str() {
                    if fname_regex.is_match( fname) {
                        list.push(entry.path())
                    }
                }
            }
        }
    }

    Ok(list)
}

/// atomically replace (or create) `dir/filename` with the given contents.
/// The data is first written and synced to a temp file in the same directory, which is then persisted under
/// the target name. Readers therefore either see the old or the new file, never a partially written one.
/// The temp file is removed if any of the steps fails
pub fn store_atomically<P: AsRef<Path>> (dir: &P, filename: &str, contents: &[u8]) -> Result<PathBuf> {
    let dir: &Path = dir.as_ref();
    let path = dir.join(filename);

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| e.error)?;

    Ok(path)
}

pub fn remove_file_if_exists (path: impl AsRef<Path>) -> Result<bool> {
    match fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e)
    }
}
