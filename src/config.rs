//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_MAX_ENTRIES;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory the cache tree lives under
    pub root: PathBuf,
    /// Maximum number of entry files kept per namespace
    pub max_entries: usize,
}

impl CacheConfig {
    /// Creates a configuration for the given root with default limits.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SHARDCACHE_ROOT` - Cache root directory (default: "cache")
    /// - `SHARDCACHE_MAX_ENTRIES` - Maximum entry files per namespace (default: 10000)
    pub fn from_env() -> Self {
        Self {
            root: env::var("SHARDCACHE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache")),
            max_entries: env::var("SHARDCACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ENTRIES),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("cache"),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
