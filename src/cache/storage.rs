//! Storage Backend Module
//!
//! Raw file primitives the cache engine is built on: atomic blob writes,
//! reads, deletes, one-level directory listings and modification times.
//! Missing files surface as `None`/`false` rather than errors; real I/O
//! failures surface as [`CacheError::Storage`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::error::{CacheError, Result};

/// Ceiling for tree walks. Entries sit two levels below a namespace
/// directory; anything nested deeper is foreign and is left alone.
const TREE_DEPTH_LIMIT: usize = 8;

// == Put ==
/// Writes `bytes` to `path` with atomic visibility.
///
/// The content goes into a temp file in the destination directory first and
/// is then renamed over `path`, so concurrent readers observe either the
/// previous content or the full new content, never a partial file. The
/// destination directory must already exist.
pub fn put(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CacheError::storage(dir, e))?;
    tmp.write_all(bytes)
        .map_err(|e| CacheError::storage(path, e))?;
    tmp.persist(path)
        .map_err(|e| CacheError::storage(path, e.error))?;
    Ok(())
}

// == Get ==
/// Reads the full content at `path`, or `None` if the file is gone.
pub fn get(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::storage(path, e)),
    }
}

// == Remove ==
/// Removes the file at `path`. Returns false if it was already gone.
pub fn remove(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::storage(path, e)),
    }
}

// == Modification Time ==
/// Returns the modification time of `path`, or `None` if the file is gone.
pub fn modified(path: &Path) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => meta
            .modified()
            .map(Some)
            .map_err(|e| CacheError::storage(path, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::storage(path, e)),
    }
}

// == List Directory ==
/// Lists the regular files directly under `dir` with their modification
/// times (one level, no descent). A missing directory lists as empty.
///
/// Files that vanish between the listing and the metadata call are skipped;
/// concurrent deletion is normal operation for a shared cache directory.
pub fn list_dir(dir: &Path) -> Result<Vec<(PathBuf, SystemTime)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::storage(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CacheError::storage(dir, e))?;
        let path = entry.path();
        match entry.metadata() {
            Ok(meta) if meta.is_file() => {
                let mtime = meta.modified().map_err(|e| CacheError::storage(&path, e))?;
                files.push((path, mtime));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::storage(&path, e)),
        }
    }
    Ok(files)
}

// == List Subdirectories ==
/// Lists the directories directly under `dir` (one level, no descent).
/// A missing directory lists as empty.
pub fn subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::storage(dir, e)),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CacheError::storage(dir, e))?;
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => dirs.push(entry.path()),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::storage(&entry.path(), e)),
        }
    }
    Ok(dirs)
}

// == Ensure Directory ==
/// Creates `dir` and any missing parents. Idempotent; a concurrent engine
/// creating the same directory is benign.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| CacheError::storage(dir, e))
}

// == Remove Tree ==
/// Deletes `dir` and everything under it with an iterative contents-first
/// walk: children are unlinked before their parent directory, and the walk
/// never recurses on the call stack or past [`TREE_DEPTH_LIMIT`].
///
/// A missing `dir` is a no-op; files removed concurrently are tolerated.
pub fn remove_tree(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(dir)
        .max_depth(TREE_DEPTH_LIMIT)
        .contents_first(true)
    {
        let entry = entry.map_err(|e| CacheError::storage(dir, e.into()))?;
        let path = entry.path();
        let removed = if entry.file_type().is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        match removed {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::storage(path, e)),
        }
    }
    Ok(())
}
