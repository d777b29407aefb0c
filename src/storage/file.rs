//! File-backed persistent store
//!
//! A synchronous `WebStorage` that keeps its map in memory and rewrites a
//! JSON file after every mutation. The rewrite goes through a temporary file
//! in the same directory followed by a rename, so a crash mid-write leaves
//! the previous contents intact.

use super::backend::{BackendError, BackendResult, WebStorage};
use crate::error::Result;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Persistent key/value store backed by a single JSON file
#[derive(Debug)]
pub struct FileWebStorage {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl FileWebStorage {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Storage file opened: {:?} ({} keys)", path, data.len());

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` and persist. The in-memory map is rolled back if the
    /// file cannot be written.
    fn mutate<F>(&self, mutate: F) -> BackendResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let previous = data.clone();
        mutate(&mut data);

        if *data == previous {
            return Ok(());
        }

        if let Err(e) = self.persist(&data) {
            *data = previous;
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> BackendResult<()> {
        let serialized =
            serde_json::to_vec_pretty(data).map_err(|e| BackendError::Other(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "storage".to_string());
        let tmp_path = self
            .path
            .with_file_name(format!(".{file_name}.{:08x}.tmp", fastrand::u32(..)));

        std::fs::write(&tmp_path, serialized).map_err(io_error)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(io_error(e));
        }

        debug!("Persisted {} keys to {:?}", data.len(), self.path);
        Ok(())
    }
}

fn io_error(e: io::Error) -> BackendError {
    BackendError::Io(e.to_string())
}

impl WebStorage for FileWebStorage {
    fn get_item(&self, key: &str) -> BackendResult<Option<String>> {
        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> BackendResult<()> {
        self.mutate(|data| {
            data.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> BackendResult<()> {
        self.mutate(|data| {
            data.remove(key);
        })
    }

    fn key(&self, index: usize) -> BackendResult<Option<String>> {
        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .nth(index)
            .cloned())
    }

    fn length(&self) -> BackendResult<usize> {
        Ok(self.data.read().unwrap_or_else(PoisonError::into_inner).len())
    }

    fn all_keys(&self) -> BackendResult<Vec<String>> {
        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn is_available(&self) -> bool {
        // A probe write would rewrite the whole file twice
        match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.exists() || std::fs::create_dir_all(parent).is_ok(),
            None => true,
        }
    }
}
