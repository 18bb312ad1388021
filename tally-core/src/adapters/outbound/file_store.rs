use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::domain::ports::outbound::{KeyValueStore, StoreError};

/// Key-value store kept as one JSON object in a user-only file.
///
/// Writes go through a temporary sibling file that is renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Unavailable(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Like `read_all`, but an unreadable file is logged and replaced.
    async fn read_for_update(&self) -> Result<Map<String, Value>, StoreError> {
        match self.read_all().await {
            Err(e @ (StoreError::Serialization(_) | StoreError::Unavailable(_))) => {
                tracing::warn!("Discarding unreadable {}: {}", self.path.display(), e);
                Ok(Map::new())
            }
            result => result,
        }
    }

    /// Replace the file in one rename so a failed write leaves the old content.
    async fn write_all(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(values)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&parent)?;

            // Created with 0600 on unix.
            let mut file = NamedTempFile::new_in(&parent)?;
            file.write_all(&content)?;
            file.as_file().sync_all()?;
            file.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("write task failed: {}", e)))?
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|k| all.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    async fn set(&self, values: HashMap<String, Value>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_for_update().await?;
        all.extend(values);
        self.write_all(&all).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut all = match self.read_all().await {
            Ok(all) => all,
            Err(StoreError::Io(e)) => return Err(StoreError::Io(e)),
            Err(e) => {
                tracing::warn!("Clearing unreadable {}: {}", self.path.display(), e);
                return self.write_all(&Map::new()).await;
            }
        };
        let before = all.len();
        for key in keys {
            all.remove(*key);
        }
        if all.len() == before {
            return Ok(());
        }
        self.write_all(&all).await
    }
}
