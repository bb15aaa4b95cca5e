//! Persistent key/value store boundary.
//!
//! The engine consumes a synchronous JSON store; it never owns one. Reads
//! that fail yield defaults and writes that fail are logged and swallowed,
//! so in-memory state stays authoritative until the next successful write.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Synchronous JSON persistence, namespaced by stable string keys.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    fn remove(&self, key: &str);

    fn clear(&self);

    /// All keys currently present, for snapshot export.
    fn keys(&self) -> Vec<String>;
}

/// Export the whole store as a single JSON object.
pub fn export_snapshot(store: &dyn StorageBackend) -> Value {
    let mut map = serde_json::Map::new();
    for key in store.keys() {
        if let Some(value) = store.get(&key) {
            map.insert(key, value);
        }
    }
    Value::Object(map)
}

/// Replace the store contents with a previously exported snapshot.
///
/// A non-object snapshot is rejected without touching the store.
pub fn import_snapshot(store: &dyn StorageBackend, snapshot: Value) -> Result<(), StorageError> {
    let Value::Object(map) = snapshot else {
        return Err(StorageError::Serialize(serde::de::Error::custom(
            "snapshot is not a JSON object",
        )));
    };

    store.clear();
    for (key, value) in map {
        store.set(&key, value)?;
    }
    Ok(())
}

/// In-memory store, used in tests and as a fallback when no data
/// directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

/// File-backed store holding one JSON object per store file.
///
/// Every mutation rewrites the whole file; each logical value is a single
/// whole-value write so no multi-step transactions are needed.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Open a store file, starting empty if it is missing or corrupt.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, Value>>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Corrupt store file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        Self {
            path,
            entries: RefCell::new(entries),
        }
    }

    /// The default store location under the platform data directory.
    pub fn default_path() -> color_eyre::Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine data directory"))?;
        Ok(data_dir.join("harmonia").join("library.json"))
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&*self.entries.borrow())?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl StorageBackend for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to persist store: {}", e);
        }
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to persist store: {}", e);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("volume", json!(70)).unwrap();

        assert_eq!(store.get("volume"), Some(json!(70)));
        store.remove("volume");
        assert_eq!(store.get("volume"), None);
    }

    #[test]
    fn snapshot_export_and_import() {
        let store = MemoryStore::new();
        store.set("favorites", json!([{"id": "t1"}])).unwrap();
        store.set("volume", json!(55)).unwrap();

        let snapshot = export_snapshot(&store);

        let restored = MemoryStore::new();
        restored.set("stale", json!(true)).unwrap();
        import_snapshot(&restored, snapshot).unwrap();

        assert_eq!(restored.get("volume"), Some(json!(55)));
        assert_eq!(restored.get("stale"), None);
    }

    #[test]
    fn import_rejects_non_object() {
        let store = MemoryStore::new();
        store.set("keep", json!(1)).unwrap();

        assert!(import_snapshot(&store, json!([1, 2, 3])).is_err());
        assert_eq!(store.get("keep"), Some(json!(1)));
    }

    #[test]
    fn file_store_survives_corrupt_contents() {
        let dir = std::env::temp_dir().join("harmonia-store-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corrupt.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.keys().is_empty());

        store.set("ok", json!(true)).unwrap();
        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("ok"), Some(json!(true)));

        std::fs::remove_file(&path).ok();
    }
}
