//! Crash-safe JSON state file.
//!
//! Writes go to a sibling temp file that is fsynced and renamed over the
//! target. Read-modify-write cycles hold an exclusive `fs2` lock on a
//! sidecar `.lock` file, which is left in place: unlinking it would let a
//! waiter that still holds the old inode race a newcomer on a fresh one.

use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomicJsonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock error on {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<AtomicJsonError> for atrium_core::AtriumError {
    fn from(e: AtomicJsonError) -> Self {
        match e {
            AtomicJsonError::Io(io) => io.into(),
            AtomicJsonError::Json(json) => json.into(),
            lock @ AtomicJsonError::Lock { .. } => atrium_core::AtriumError::storage(lock.to_string()),
        }
    }
}

/// A JSON document on disk holding one `T`.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    recover_corrupt: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            recover_corrupt: false,
            _marker: PhantomData,
        }
    }

    /// Treat an unparseable file as empty on [`update`](Self::update)
    /// instead of failing; the next write replaces it.
    pub fn recover_corrupt(mut self) -> Self {
        self.recover_corrupt = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing or blank file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Locked read-modify-write. A missing file starts from `T::default()`.
    pub fn update<F>(&self, f: F) -> Result<(), AtomicJsonError>
    where
        F: FnOnce(&mut T),
    {
        let _guard = self.lock()?;

        let mut data = match self.load() {
            Ok(data) => data.unwrap_or_default(),
            Err(AtomicJsonError::Json(err)) if self.recover_corrupt => {
                tracing::warn!(path = %self.path.display(), error = %err, "Replacing unreadable state file");
                T::default()
            }
            Err(err) => return Err(err),
        };
        f(&mut data);
        self.write(&data)
    }

    fn write(&self, data: &T) -> Result<(), AtomicJsonError> {
        let parent = self.parent_dir()?;
        fs::create_dir_all(parent)?;

        let tmp_path = self.sibling(".tmp")?;
        let mut tmp = File::create(&tmp_path)?;
        serde_json::to_writer_pretty(&mut tmp, data)?;
        tmp.flush()?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn lock(&self) -> Result<LockGuard, AtomicJsonError> {
        fs::create_dir_all(self.parent_dir()?)?;
        let lock_path = self.sibling(".lock")?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()
            .map_err(|source| AtomicJsonError::Lock {
                path: lock_path,
                source,
            })?;
        Ok(LockGuard(file))
    }

    fn parent_dir(&self) -> Result<&Path, AtomicJsonError> {
        self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "state path has no parent").into()
        })
    }

    /// `.<file name><suffix>` next to the document.
    fn sibling(&self, suffix: &str) -> Result<PathBuf, AtomicJsonError> {
        let name = self.path.file_name().ok_or_else(|| {
            AtomicJsonError::from(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "state path has no file name",
            ))
        })?;
        Ok(self
            .parent_dir()?
            .join(format!(".{}{}", name.to_string_lossy(), suffix)))
    }
}

/// Holds the exclusive lock until dropped.
struct LockGuard(File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}
