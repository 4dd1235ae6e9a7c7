//! Cache Module
//!
//! The cache engine and its layers: pure path resolution, raw file storage,
//! compression, directory protection and the engine tying them together.

mod compress;
mod engine;
mod paths;
mod protect;
mod stats;
mod storage;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use engine::{Cache, Namespace};
pub use paths::{entry_path, key_digest};
pub use protect::{DenyAllHook, NoProtection, ProtectionHook};
pub use stats::{CacheStats, StatsSnapshot};

// == Public Constants ==
/// Default per-namespace entry file limit enforced by eviction.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// File extension of entry files. Sweeps and counts only ever touch files
/// carrying it, leaving markers and in-flight temp files alone.
pub const ENTRY_EXTENSION: &str = "cache";
