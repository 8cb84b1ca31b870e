//! JSON-file backed key-value store.
//!
//! All keys live in one JSON object on disk. Every write rewrites the file
//! atomically, so a crash never leaves a half-written snapshot.

use super::atomic_json::{AtomicJsonError, AtomicJsonFile};
use atrium_core::error::{AtriumError, Result};
use atrium_core::storage::KeyValueStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Entries = BTreeMap<String, String>;

/// Key-value store persisted to a single JSON file.
///
/// File layout:
/// ```text
/// {
///   "atrium.conversations": "{...}",
///   "atrium.guest_id": "7d9c..."
/// }
/// ```
#[derive(Clone)]
pub struct FileKeyValueStore {
    file: Arc<AtomicJsonFile<Entries>>,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path).recover_corrupt()),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    async fn with_file<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicJsonFile<Entries>) -> std::result::Result<R, AtomicJsonError>
            + Send
            + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| AtriumError::internal(format!("Storage task failed: {}", e)))?
            .map_err(AtriumError::from)
    }

    /// Applies `mutate` to the stored entries; an unreadable file is
    /// replaced.
    async fn mutate<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Entries) + Send + 'static,
    {
        self.with_file(move |file| file.update(mutate)).await
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.with_file(move |file| match file.load() {
            Ok(entries) => Ok(entries.and_then(|mut e| e.remove(&key))),
            Err(AtomicJsonError::Json(err)) => {
                tracing::warn!(path = %file.path().display(), error = %err, "Store file is unreadable");
                Ok(None)
            }
            Err(err) => Err(err),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.mutate(move |entries| {
            entries.insert(key, value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.mutate(move |entries| {
            entries.remove(&key);
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.mutate(|entries| entries.clear()).await
    }
}
