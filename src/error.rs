//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// A missing entry is deliberately not an error: read-path operations report
/// absence through `Option`/`bool` return values, so a plain miss, an expired
/// entry and a corrupted entry all look the same to the caller.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Underlying filesystem I/O failure (permission denied, disk full, ...)
    #[error("Storage failure at {path:?}: {source}")]
    Storage {
        /// Path the failing operation was addressing
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Namespace name is not a single safe path segment
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),
}

impl CacheError {
    /// Wraps an I/O error together with the path it occurred on.
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
