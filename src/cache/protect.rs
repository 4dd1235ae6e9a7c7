//! Directory Protection Module
//!
//! Cache directories often end up under a web server's document root. A
//! [`ProtectionHook`] runs whenever the engine materializes a cache or
//! namespace directory and gets the chance to drop guard files into it.

use std::path::Path;

use crate::cache::storage;
use crate::error::Result;

/// Marker file denying web server access to a cache directory.
const HTACCESS_FILE: &str = ".htaccess";
const HTACCESS_BODY: &[u8] = b"deny from all\n";

/// Blank page served if directory listing is attempted anyway.
const INDEX_FILE: &str = "index.html";

// == Hook Trait ==
/// Invoked once per materialized cache or namespace directory.
///
/// Implementations must be idempotent; the engine may call them again for
/// a directory that was already protected.
pub trait ProtectionHook: Send + Sync {
    fn protect(&self, dir: &Path) -> Result<()>;
}

// == Deny-All Hook ==
/// Drops an Apache `deny from all` `.htaccess` and an empty `index.html`
/// into the directory. Existing files are left untouched, so a marker is
/// written once and never clobbers local edits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllHook;

impl ProtectionHook for DenyAllHook {
    fn protect(&self, dir: &Path) -> Result<()> {
        let htaccess = dir.join(HTACCESS_FILE);
        if !htaccess.exists() {
            storage::put(&htaccess, HTACCESS_BODY)?;
        }
        let index = dir.join(INDEX_FILE);
        if !index.exists() {
            storage::put(&index, b"")?;
        }
        Ok(())
    }
}

// == No-Op Hook ==
/// Leaves directories alone, for caches that never sit under a document
/// root.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProtection;

impl ProtectionHook for NoProtection {
    fn protect(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}
