//! Durable key-value storage behind the session store.
//!
//! # Key invariants
//! - Reads never fail on missing or corrupt data; they report `None` and
//!   leave cleanup to the caller.
//! - `remove` of an absent key succeeds.
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    async fn remove(&self, key: &str) -> ClientResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> ClientResult<BTreeMap<String, String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "discarding corrupt session storage");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn store(&self, entries: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(entries)
            .map_err(|err| ClientError::Storage(err.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries).await
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.store(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(storage: &dyn KeyValueStorage) -> ClientResult<()> {
        assert_eq!(storage.get("token").await?, None);
        storage.set("token", "abc").await?;
        storage.set("user", "{}").await?;
        assert_eq!(storage.get("token").await?.as_deref(), Some("abc"));
        storage.remove("token").await?;
        storage.remove("token").await?;
        assert_eq!(storage.get("token").await?, None);
        assert_eq!(storage.get("user").await?.as_deref(), Some("{}"));
        Ok(())
    }

    #[tokio::test]
    async fn memory_storage_basics() -> ClientResult<()> {
        exercise(&MemoryStorage::new()).await
    }

    #[tokio::test]
    async fn file_storage_basics_and_persistence() -> ClientResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("session.json");
        exercise(&FileStorage::new(&path)).await?;

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("user").await?.as_deref(), Some("{}"));
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() -> ClientResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{not json").await?;
        let storage = FileStorage::new(&path);
        assert_eq!(storage.get("token").await?, None);
        storage.set("token", "fresh").await?;
        assert_eq!(storage.get("token").await?.as_deref(), Some("fresh"));
        Ok(())
    }
}
