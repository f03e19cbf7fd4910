// src/storage/kv_store.rs
//! Key-value backends for the persistent session slot.
//!
//! Provides a small string-to-string store abstraction with two backends:
//! - [`MemoryStore`]: process-local, used by tests and embedded hosts
//! - [`FileStore`]: one file per key under a directory, so a session
//!   survives process restarts (the CLI uses this one)
//!
//! Backends report failures as [`StorageError`]; it is up to the caller to
//! decide whether a failure matters. The session store treats every failure
//! as "no session".

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Persistent string slots addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Reads a slot. `Ok(None)` when the slot is empty.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a slot, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a slot. Removing an empty slot is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store backed by a mutex-protected hashmap.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }
}

/// File-backed store: each key maps to `<dir>/<key>`.
///
/// The directory is created lazily on first write. Keys are restricted to
/// ASCII alphanumerics, `_` and `-` so they can never escape the directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a half-written slot.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_slots() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("slot").unwrap(), None);

        store.set("slot", "one").unwrap();
        store.set("slot", "two").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("two"));
        assert_eq!(store.len(), 1);

        store.remove("slot").unwrap();
        store.remove("slot").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested");

        FileStore::new(&path).set("zkp_session_data", "value").unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("zkp_session_data").unwrap().as_deref(), Some("value"));

        reopened.remove("zkp_session_data").unwrap();
        assert_eq!(reopened.get("zkp_session_data").unwrap(), None);
        // Idempotent.
        reopened.remove("zkp_session_data").unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        for key in ["", "../escape", "a/b", "dot.key"] {
            assert!(matches!(store.set(key, "x"), Err(StorageError::InvalidKey(_))));
        }
    }
}
