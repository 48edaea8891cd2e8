//! Cache service — tenant-scoped write-through cache of the page collection.
//!
//! DESIGN
//! ======
//! The cache is read first on load for instant display and written after
//! every local change. Reads go straight to the backend. Writes serialize
//! an owned copy of the collection and go through a [`Debouncer`], so a
//! burst of mutations inside the window produces one backend write.
//!
//! ERROR HANDLING
//! ==============
//! The cache is best-effort. A missing or undecodable entry is a miss;
//! write failures are logged and dropped. Nothing here surfaces to the
//! caller as an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{error, warn};

use super::persistence::Debouncer;
use crate::grid::Page;

/// Storage key prefix; the tenant identifier is appended.
pub const CACHE_KEY_PREFIX: &str = "cms_pages";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Storage key for a tenant's page collection.
#[must_use]
pub fn storage_key(tenant: &str) -> String {
    format!("{CACHE_KEY_PREFIX}_{tenant}")
}

// =============================================================================
// BACKENDS
// =============================================================================

/// Raw string key/value storage under the cache.
pub trait CacheBackend: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Delete a value. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// Process-lifetime storage that does not survive a restart, the
/// session-scoped default.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        // Write then rename so a crash never leaves a half-written entry.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(tmp, self.path(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// CACHE STORE
// =============================================================================

struct PendingWrite {
    tenant: String,
    pages: Vec<Page>,
}

/// Debounced, tenant-scoped page cache.
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    debouncer: Debouncer<PendingWrite>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, debounce: Duration) -> Self {
        let sink_backend = Arc::clone(&backend);
        let debouncer = Debouncer::new(debounce, move |write: PendingWrite| {
            write_pages(sink_backend.as_ref(), &write.tenant, &write.pages);
        });
        Self { backend, debouncer }
    }

    /// Cached collection for `tenant`, or `None` on a miss.
    ///
    /// An entry that fails to decode is treated as a miss.
    #[must_use]
    pub fn load(&self, tenant: &str) -> Option<Vec<Page>> {
        let key = storage_key(tenant);
        let raw = match self.backend.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, %tenant, "cache read failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str::<Vec<Page>>(&raw) {
            Ok(pages) => Some(pages),
            Err(e) => {
                warn!(error = %e, %tenant, "cache entry corrupt; treating as miss");
                None
            }
        }
    }

    /// Schedule a debounced write of an owned copy of `pages`.
    pub fn save(&self, pages: &[Page], tenant: &str) {
        self.debouncer
            .schedule(PendingWrite { tenant: tenant.to_owned(), pages: pages.to_vec() });
    }

    /// Write any pending save now. Returns `false` if nothing was pending.
    pub fn flush(&self) -> bool {
        self.debouncer.flush()
    }

    /// Drop any pending save.
    pub fn cancel(&self) {
        self.debouncer.cancel();
    }

    /// Remove the cached collection for `tenant`.
    pub fn clear(&self, tenant: &str) {
        self.debouncer.cancel();
        if let Err(e) = self.backend.remove(&storage_key(tenant)) {
            error!(error = %e, %tenant, "cache clear failed");
        }
    }
}

fn write_pages(backend: &dyn CacheBackend, tenant: &str, pages: &[Page]) {
    let encoded = match serde_json::to_string(pages) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!(error = %e, %tenant, "cache encode failed");
            return;
        }
    };
    if let Err(e) = backend.write(&storage_key(tenant), &encoded) {
        error!(error = %e, %tenant, count = pages.len(), "cache write failed");
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
