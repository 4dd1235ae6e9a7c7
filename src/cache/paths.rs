//! Path Resolver Module
//!
//! Maps logical keys to filesystem paths. A key is never used as a filename
//! directly: its SHA-1 digest provides a fixed-length, filesystem-safe name,
//! and the first two hex characters of the digest form a shard subdirectory
//! that bounds directory fan-out to 256 shards per namespace.

use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::cache::ENTRY_EXTENSION;

// == Key Digest ==
/// Computes the lowercase hex SHA-1 digest of a key.
///
/// The digest is 40 hex characters (160 bits), wide enough that distinct
/// keys collide only with negligible probability.
pub fn key_digest(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

// == Shard Name ==
/// Returns the shard directory name for a digest (its first two hex chars).
pub fn shard_name(digest: &str) -> &str {
    &digest[..2]
}

// == Entry Path ==
/// Resolves the entry file path for `key` below `namespace_dir`.
///
/// Layout: `<namespace_dir>/<2-hex-shard>/<40-hex-digest>.cache`. This is
/// pure path math; the engine creates the shard directory before the path
/// is written to.
pub fn entry_path(namespace_dir: &Path, key: &str) -> PathBuf {
    let digest = key_digest(key);
    namespace_dir
        .join(shard_name(&digest))
        .join(format!("{}.{}", digest, ENTRY_EXTENSION))
}

// == Entry File Check ==
/// Returns true if `path` names an entry file, judged by its extension.
///
/// Marker files ('.htaccess', 'index.html') and in-flight temp files never
/// carry the entry extension, so sweeps and eviction scans skip them.
pub fn is_entry_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION)
}

// == Shard Directory Check ==
/// Returns true if `path` names a shard directory: exactly two lowercase
/// hex characters, as produced by [`shard_name`].
///
/// Namespace sweeps descend only into directories this accepts, so sibling
/// namespace directories under the cache root are left alone.
pub fn is_shard_dir(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            name.len() == 2
                && name
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        }
        None => false,
    }
}
