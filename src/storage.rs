use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No data directory available on this platform")]
    NoDataDir,
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// String key-value persistence shared by the session and theme layers.
///
/// Every key is optional: a missing key means "default state".
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

type Entries = BTreeMap<String, String>;

/// JSON file backed store. The whole map is rewritten on every change.
pub struct FileStore {
    storage_path: PathBuf,
    data: Mutex<Entries>,
}

impl FileStore {
    /// `<data_dir>/genex/storage.json`
    pub fn default_path() -> Result<PathBuf, StorageError> {
        let data_dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;
        Ok(data_dir.join("genex").join("storage.json"))
    }

    /// Open the store at `path`, loading existing entries. A missing file is
    /// an empty store; it is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage_path = path.into();
        let data = if storage_path.exists() {
            let mut file = File::open(&storage_path)?;
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            if contents.trim().is_empty() {
                Entries::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Entries::new()
        };
        debug!(path = %storage_path.display(), keys = data.len(), "Opened key-value store");
        Ok(Self {
            storage_path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Persist using a temporary file and an atomic rename to avoid partial writes.
    fn save(path: &Path, data: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = path.with_extension("tmp");
        let mut f = File::create(&temp)?;
        let content = serde_json::to_string_pretty(data)?;
        f.write_all(content.as_bytes())?;
        f.sync_all()?;
        fs::rename(temp, path)?;
        Ok(())
    }

    fn mutate(&self, apply: impl FnOnce(&mut Entries) -> bool) -> Result<(), StorageError> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        if apply(&mut data) {
            Self::save(&self.storage_path, &data)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(|data| {
            data.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(|data| data.remove(key).is_some())
    }
}

/// Volatile store, used when nothing should outlive the process.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("access_token").unwrap(), None);
        store.set("access_token", "abc").unwrap();
        store.set("genex-theme", "onyx").unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("access_token").unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("genex-theme").unwrap().as_deref(), Some("onyx"));
    }

    #[test]
    fn file_store_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let store = FileStore::open(&path).unwrap();
        store.set("user_data", "{}").unwrap();
        store.remove("user_data").unwrap();
        // removing a missing key is fine
        store.remove("user_data").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("user_data").unwrap(), None);
    }

    #[test]
    fn empty_file_opens_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StorageError::Json(_))));
    }

    #[test]
    fn memory_store_basics() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
