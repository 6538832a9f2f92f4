//! # Key-Value Snapshot Storage
//!
//! The favorites store persists one JSON string under one key. This module
//! defines that capability and the two backends that need no external
//! service: an in-memory map and a directory of one file per key.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::StorageError;

/// A synchronous string key-value slot store.
pub trait KeyValueStore: Send + Sync {
    /// Reads a slot; `Ok(None)` when it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrites a slot.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local store, mostly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with one slot pre-populated.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Uses `dir` as the storage root; it is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The storage root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Backend(format!("invalid slot key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash never leaves a half-written snapshot.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_counts_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn seeded_memory_store_has_no_writes() {
        let store = MemoryStore::with_entry("k", "seed");
        assert_eq!(store.get("k").unwrap().as_deref(), Some("seed"));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn file_store_round_trips_and_creates_the_directory() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let store = FileStore::new(temp_dir.path().join("nested"));
        assert_eq!(store.get("trialFavorites").unwrap(), None);

        store.set("trialFavorites", "[]").unwrap();
        assert_eq!(store.get("trialFavorites").unwrap().as_deref(), Some("[]"));
        assert!(store.dir().join("trialFavorites.json").is_file());
        assert!(!store.dir().join("trialFavorites.json.tmp").exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(matches!(store.set("../escape", "x"), Err(StorageError::Backend(_))));
        assert!(matches!(store.get(""), Err(StorageError::Backend(_))));
    }
}
