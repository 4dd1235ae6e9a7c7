//! Cache Engine Module
//!
//! Ties the path resolver, storage backend and compression together into
//! the public cache API. A [`Cache`] is immutable after construction;
//! callers operate through lightweight [`Namespace`] views bound to one
//! partition of the cache root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::cache::protect::{DenyAllHook, ProtectionHook};
use crate::cache::stats::{CacheStats, StatsSnapshot};
use crate::cache::{compress, paths, storage, DEFAULT_MAX_ENTRIES};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache ==
/// A file-backed key/value cache rooted at one directory.
///
/// Holds only the root path, the per-namespace entry limit, the directory
/// protection hook and the stats counters, so it is cheap to share across
/// threads. All storage state lives on disk; two `Cache` instances (or two
/// processes) pointed at the same root see the same entries.
pub struct Cache {
    root: PathBuf,
    max_entries: usize,
    hook: Box<dyn ProtectionHook>,
    stats: CacheStats,
}

impl Cache {
    /// Opens a cache at `root` with the default entry limit, creating and
    /// protecting the root directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_capacity(root, DEFAULT_MAX_ENTRIES)
    }

    /// Opens a cache at `root` keeping at most `max_entries` entry files
    /// per namespace.
    pub fn with_capacity(root: impl Into<PathBuf>, max_entries: usize) -> Result<Self> {
        Self::build(root.into(), max_entries, Box::new(DenyAllHook))
    }

    /// Opens a cache from a [`CacheConfig`].
    pub fn from_config(config: CacheConfig) -> Result<Self> {
        Self::build(config.root, config.max_entries, Box::new(DenyAllHook))
    }

    /// Opens a cache with a custom directory protection hook in place of
    /// the default [`DenyAllHook`].
    pub fn with_hook(
        root: impl Into<PathBuf>,
        max_entries: usize,
        hook: impl ProtectionHook + 'static,
    ) -> Result<Self> {
        Self::build(root.into(), max_entries, Box::new(hook))
    }

    fn build(root: PathBuf, max_entries: usize, hook: Box<dyn ProtectionHook>) -> Result<Self> {
        storage::ensure_dir(&root)?;
        hook.protect(&root)?;
        Ok(Self {
            root,
            max_entries,
            hook,
            stats: CacheStats::default(),
        })
    }

    /// Returns the view on the unnamed partition directly under the root.
    pub fn root(&self) -> Namespace<'_> {
        Namespace {
            cache: self,
            dir: self.root.clone(),
            name: None,
        }
    }

    /// Returns the view on the named partition, creating and protecting
    /// its directory if needed.
    ///
    /// The name must be a single safe path segment: non-empty, no path
    /// separators, not `.` or `..`.
    pub fn namespace(&self, name: &str) -> Result<Namespace<'_>> {
        validate_namespace(name)?;
        let dir = self.root.join(name);
        storage::ensure_dir(&dir)?;
        self.hook.protect(&dir)?;
        Ok(Namespace {
            cache: self,
            dir,
            name: Some(name.to_string()),
        })
    }

    /// Directory the cache tree lives under.
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Per-namespace entry file limit enforced by eviction.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Snapshot of the hit/miss/eviction counters for this instance.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

// the hook is a trait object without a Debug bound
impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("root", &self.root)
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}

fn validate_namespace(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name
            .chars()
            .any(|c| std::path::is_separator(c) || c == '\\' || c == '\0');
    if bad {
        return Err(CacheError::InvalidNamespace(name.to_string()));
    }
    Ok(())
}

// == Namespace View ==
/// Borrowed handle on one partition of a [`Cache`]. All entry operations
/// live here; the view itself holds no entry state and can be recreated at
/// will.
#[derive(Debug)]
pub struct Namespace<'a> {
    cache: &'a Cache,
    dir: PathBuf,
    name: Option<String>,
}

impl Namespace<'_> {
    /// Directory this namespace stores its shards under.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Namespace name, or `None` for the root partition.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // == Write ==
    /// Stores `content` under `key`, compressed, replacing any previous
    /// entry and resetting its age. Afterwards runs the eviction check,
    /// which removes the single oldest entry in this namespace if the
    /// entry count exceeds the cache's limit.
    ///
    /// # Arguments
    /// * `key` - Logical key, any UTF-8 string
    /// * `content` - Raw bytes to store
    pub fn write(&self, key: &str, content: &[u8]) -> Result<()> {
        let path = self.resolve_for_write(key)?;
        let packed =
            compress::compress(content).map_err(|e| CacheError::storage(&path, e))?;
        storage::put(&path, &packed)?;
        self.cache.stats.record_write();
        debug!(
            ns = self.label(),
            digest = %paths::key_digest(key),
            size = content.len(),
            "entry written"
        );

        self.evict_over_capacity()
    }

    // == Read ==
    /// Retrieves the content stored under `key` if a valid entry exists.
    ///
    /// An entry older than `max_age` is deleted and reported as a miss;
    /// `max_age = None` means entries never expire by age. A stored file
    /// that fails to decompress also reads as a miss (logged, left on
    /// disk), so callers only ever distinguish hit from miss.
    ///
    /// # Returns
    /// The original (decompressed) bytes, or `None` on any kind of miss.
    pub fn read(&self, key: &str, max_age: Option<Duration>) -> Result<Option<Vec<u8>>> {
        if !self.evict_if_expired(key, max_age)? {
            self.cache.stats.record_miss();
            debug!(ns = self.label(), digest = %paths::key_digest(key), "cache miss");
            return Ok(None);
        }
        self.fetch(key)
    }

    // == Peek ==
    /// Like [`read`](Self::read), but never deletes: an expired entry is
    /// reported as a miss and stays on disk, so a later read with a looser
    /// `max_age` can still see it.
    pub fn peek(&self, key: &str, max_age: Option<Duration>) -> Result<Option<Vec<u8>>> {
        if !self.is_valid(key, max_age)? {
            self.cache.stats.record_miss();
            return Ok(None);
        }
        self.fetch(key)
    }

    // == Validity Check ==
    /// Returns true if an entry for `key` exists and is no older than
    /// `max_age` (`age == max_age` still counts as valid). Pure query, no
    /// side effects.
    pub fn is_valid(&self, key: &str, max_age: Option<Duration>) -> Result<bool> {
        let path = paths::entry_path(&self.dir, key);
        match entry_age(&path)? {
            Some(age) => Ok(within_age(age, max_age)),
            None => Ok(false),
        }
    }

    // == Expiry Eviction ==
    /// Same truth value as [`is_valid`](Self::is_valid), but an entry that
    /// exists and is expired is deleted before `false` is returned.
    pub fn evict_if_expired(&self, key: &str, max_age: Option<Duration>) -> Result<bool> {
        let path = paths::entry_path(&self.dir, key);
        match entry_age(&path)? {
            None => Ok(false),
            Some(age) if within_age(age, max_age) => Ok(true),
            Some(age) => {
                storage::remove(&path)?;
                self.cache.stats.record_expiration();
                debug!(
                    ns = self.label(),
                    digest = %paths::key_digest(key),
                    age_secs = age.as_secs(),
                    "expired entry removed"
                );
                Ok(false)
            }
        }
    }

    // == Delete ==
    /// Removes the entry for `key`. Deleting a key that has no entry is
    /// not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        let path = paths::entry_path(&self.dir, key);
        if storage::remove(&path)? {
            debug!(ns = self.label(), digest = %paths::key_digest(key), "entry deleted");
        }
        Ok(())
    }

    // == Clear ==
    /// Sweeps this namespace and removes every entry file whose age is at
    /// least `max_age`; with `max_age = None` every entry file goes. Shard
    /// directories and marker files stay in place.
    ///
    /// # Returns
    /// The number of entry files removed.
    pub fn clear(&self, max_age: Option<Duration>) -> Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        for (path, mtime) in self.entry_files()? {
            let stale = match max_age {
                None => true,
                Some(limit) => now.duration_since(mtime).unwrap_or(Duration::ZERO) >= limit,
            };
            if stale && storage::remove(&path)? {
                removed += 1;
            }
        }
        debug!(ns = self.label(), removed, "namespace cleared");
        Ok(removed)
    }

    // == Clear All ==
    /// Deletes this namespace's whole directory tree, entries and markers
    /// alike, and reports success. An already-absent directory counts as
    /// success; the next write recreates the chain (and re-protects it).
    ///
    /// Failure is reported rather than returned as an error because a
    /// partially removed tree is still a working cache directory.
    pub fn clear_all(&self) -> bool {
        match storage::remove_tree(&self.dir) {
            Ok(()) => {
                debug!(ns = self.label(), "namespace tree removed");
                true
            }
            Err(e) => {
                warn!(ns = self.label(), error = %e, "failed to remove namespace tree");
                false
            }
        }
    }

    // == Entry Count ==
    /// Number of entry files currently stored in this namespace, across
    /// all its shards.
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.entry_files()?.len())
    }

    // == Internals ==
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("root")
    }

    /// Recreates the namespace (and root) directory chain if a clear_all
    /// took it away, re-running the protection hook on what it recreates.
    fn ensure_dirs(&self) -> Result<()> {
        if self.dir.exists() {
            return Ok(());
        }
        if self.dir != self.cache.root && !self.cache.root.exists() {
            storage::ensure_dir(&self.cache.root)?;
            self.cache.hook.protect(&self.cache.root)?;
        }
        storage::ensure_dir(&self.dir)?;
        self.cache.hook.protect(&self.dir)?;
        Ok(())
    }

    fn resolve_for_write(&self, key: &str) -> Result<PathBuf> {
        self.ensure_dirs()?;
        let path = paths::entry_path(&self.dir, key);
        if let Some(shard) = path.parent() {
            storage::ensure_dir(shard)?;
        }
        Ok(path)
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = paths::entry_path(&self.dir, key);
        let packed = match storage::get(&path)? {
            Some(bytes) => bytes,
            // valid a moment ago, deleted by a concurrent engine since
            None => {
                self.cache.stats.record_miss();
                return Ok(None);
            }
        };
        match compress::decompress(&packed) {
            Ok(content) => {
                self.cache.stats.record_hit();
                debug!(
                    ns = self.label(),
                    digest = %paths::key_digest(key),
                    size = content.len(),
                    "cache hit"
                );
                Ok(Some(content))
            }
            Err(e) => {
                self.cache.stats.record_miss();
                warn!(
                    ns = self.label(),
                    digest = %paths::key_digest(key),
                    error = %e,
                    "corrupt entry, treating as miss"
                );
                Ok(None)
            }
        }
    }

    /// Entry files in this namespace: stray ones directly in the namespace
    /// directory plus everything one level down in the shard directories.
    fn entry_files(&self) -> Result<Vec<(PathBuf, SystemTime)>> {
        let mut files: Vec<_> = storage::list_dir(&self.dir)?
            .into_iter()
            .filter(|(p, _)| paths::is_entry_file(p))
            .collect();
        for shard in storage::subdirs(&self.dir)? {
            if !paths::is_shard_dir(&shard) {
                continue;
            }
            files.extend(
                storage::list_dir(&shard)?
                    .into_iter()
                    .filter(|(p, _)| paths::is_entry_file(p)),
            );
        }
        Ok(files)
    }

    /// One eviction per write: if the namespace holds more entry files
    /// than the limit, the single oldest one goes. The ceiling is soft
    /// under concurrent writers.
    fn evict_over_capacity(&self) -> Result<()> {
        let files = self.entry_files()?;
        if files.len() <= self.cache.max_entries {
            return Ok(());
        }
        if let Some((victim, _)) = files.into_iter().min_by_key(|entry| entry.1) {
            match storage::remove(&victim) {
                Ok(true) => {
                    self.cache.stats.record_eviction();
                    debug!(ns = self.label(), victim = %victim.display(), "evicted oldest entry");
                }
                // raced with a concurrent delete, the space is freed either way
                Ok(false) => {}
                Err(e) => {
                    warn!(ns = self.label(), error = %e, "failed to evict oldest entry");
                }
            }
        }
        Ok(())
    }
}

fn within_age(age: Duration, max_age: Option<Duration>) -> bool {
    match max_age {
        None => true,
        Some(limit) => age <= limit,
    }
}

/// Age of the file at `path` derived from its mtime, `None` if the file is
/// gone. An mtime in the future (clock skew, copied trees) counts as age
/// zero.
fn entry_age(path: &Path) -> Result<Option<Duration>> {
    match storage::modified(path)? {
        Some(mtime) => Ok(Some(
            SystemTime::now()
                .duration_since(mtime)
                .unwrap_or(Duration::ZERO),
        )),
        None => Ok(None),
    }
}
