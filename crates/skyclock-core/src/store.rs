//! Local key-value persistence.
//!
//! This is the process-wide store behind the weather cache, the selected
//! place and the time-format preference. Values are JSON strings; the store
//! itself knows nothing about their shape. A file-backed implementation is
//! used by the application, an in-memory one by tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

/// Key for the persisted 12h/24h time format preference.
pub const TIME_FORMAT_KEY: &str = "time_format";

/// Key for the persisted place selection.
pub const SELECTED_PLACE_KEY: &str = "selected_place";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key to JSON-string value storage.
///
/// There is never more than one concurrent writer, so implementations do not
/// need transactional guarantees.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Write or overwrite the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Shared handle to a store, cloneable across services and spawned tasks.
pub type SharedStore = Arc<Mutex<Box<dyn KvStore>>>;

/// Wrap a store into a [`SharedStore`] handle.
pub fn shared(store: impl KvStore + 'static) -> SharedStore {
    Arc::new(Mutex::new(Box::new(store)))
}

/// File-backed store: a single JSON document in the config directory.
pub struct FileStore {
    path: PathBuf,
    map: HashMap<String, String>,
}

impl FileStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    /// Fails if the file exists but cannot be read or parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            HashMap::new()
        };
        Ok(Self { path, map })
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.map)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.map.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }
}
