//! # shardcache
//!
//! A file-backed key/value cache. Content is stored compressed under a
//! content-addressed path derived from the key's SHA-1 digest, sharded into
//! at most 256 subdirectories per namespace. Expiration is driven entirely
//! by file modification times, and a soft per-namespace capacity limit
//! evicts the oldest entry after every write.
//!
//! Values are opaque byte strings; serialization is the caller's business.
//! There is no in-memory hot path, so any number of threads or processes
//! can share one cache root.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use shardcache::{Cache, Result};
//!
//! fn main() -> Result<()> {
//!     let cache = Cache::new("/var/tmp/app-cache")?;
//!     let pages = cache.namespace("pages")?;
//!
//!     pages.write("home", b"<html>...</html>")?;
//!
//!     // Miss once the entry is older than five minutes.
//!     if let Some(bytes) = pages.read("home", Some(Duration::from_secs(300)))? {
//!         assert_eq!(bytes, b"<html>...</html>");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    Cache, CacheStats, DenyAllHook, Namespace, NoProtection, ProtectionHook, StatsSnapshot,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
