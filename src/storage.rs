//! Durable key-value storage.
//!
//! DESIGN
//! ======
//! The app persists everything through a flat string-to-string map, the same
//! contract a browser's local/session storage exposes. One type covers both
//! scopes: `open()` gives an app-lifetime store backed by a JSON file that is
//! rewritten on every mutation (write-through, so a crash never loses an
//! acknowledged write), and `in_memory()` gives a session-lifetime store whose
//! contents die with the process.
//!
//! Callers never share a `KvStore` directly; `AppState` wraps each scope in an
//! `Arc<RwLock>` so every read-modify-write cycle is serialized behind a
//! single owner.

use std::collections::HashMap;
use std::path::PathBuf;

/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A flat, durable string map. App scope is file-backed; session scope is
/// memory-only. Same API either way.
#[derive(Debug)]
pub struct KvStore {
    /// Backing file for the app-lifetime scope; `None` for session scope.
    path: Option<PathBuf>,
    entries: HashMap<String, String>,
}

impl KvStore {
    /// Create a session-scoped store. Nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: None, entries: HashMap::new() }
    }

    /// Open (or create) an app-scoped store backed by a JSON file.
    ///
    /// A missing file is an empty store, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path: Some(path), entries })
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set a key, overwriting any previous value, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    /// Remove a key and persist. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
