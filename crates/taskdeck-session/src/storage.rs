//! Key-value persistence for session state that outlives a process

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SessionError};

/// String key-value storage, as offered by the host environment
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// Volatile store, for tests and sessions that need no persistence
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// A key-value store kept as one JSON object on disk
///
/// Directory structure:
/// ```text
/// data-dir/
/// └── storage.json    # { "key": "value", ... }
/// ```
pub struct FileKeyValueStore {
    path: PathBuf,

    /// Serializes read-modify-write cycles on the file
    write_lock: tokio::sync::Mutex<()>,
}

impl FileKeyValueStore {
    const STORAGE_FILE: &'static str = "storage.json";

    /// Open (or create) a store in `dir`
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let store = Self {
            path: dir.join(Self::STORAGE_FILE),
            write_lock: tokio::sync::Mutex::new(()),
        };
        info!("Opened key-value store at {:?}", store.path);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path).await?;
        serde_json::from_str(&json).map_err(|e| {
            SessionError::Storage(format!("Corrupt storage file {:?}: {}", self.path, e))
        })
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.load().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);

        // Write to a sibling file first so a crash never leaves half a document
        let json = serde_json::to_string_pretty(&entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!("Saved key '{}' to {:?}", key, self.path);
        Ok(())
    }
}
