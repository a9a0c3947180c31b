//! Storage backends and the stored-file capability.
//!
//! A [`Storage`] maps logical names to bytes, independent of where those bytes
//! live. [`FileSystemStorage`] is the stock implementation, rooted at a
//! directory (the configured `media_root` by default).
//!
//! [`StoredFile`] is the narrow capability a "model field" has to offer so an
//! [`ImageQuery`](crate::ImageQuery) can load from it: a storage-relative name
//! plus the backend that name belongs to. [`FieldFile`] is a plain struct
//! implementing it; application types can implement the trait directly.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("'{0}' does not exist in storage")]
    NotFound(String),
    #[error("'{0}' points outside the storage root")]
    SuspiciousName(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Name-to-bytes backend.
///
/// Implementations must be shareable across threads; handles keep them behind
/// an `Arc<dyn Storage>`.
pub trait Storage: fmt::Debug + Send + Sync {
    /// Read the full contents stored under `name`.
    fn open(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Store `content` under `name`, replacing anything already there.
    fn save(&self, name: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Whether something is stored under `name`.
    fn exists(&self, name: &str) -> bool;

    /// Local filesystem path for `name`, if the backend has one.
    fn path(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// Storage backed by a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemStorage {
    location: PathBuf,
}

impl FileSystemStorage {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Resolve `name` against the root. Absolute names are used as-is;
    /// any `..` component is rejected.
    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(StorageError::SuspiciousName(name.to_string()));
        }
        Ok(self.location.join(relative))
    }
}

impl Storage for FileSystemStorage {
    fn open(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        debug!(path = %path.display(), "Reading from filesystem storage");
        std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::Io(e),
        })
    }

    fn save(&self, name: &str, content: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), bytes = content.len(), "Writing to filesystem storage");
        std::fs::write(&path, content)?;
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|p| p.is_file())
    }

    fn path(&self, name: &str) -> Option<PathBuf> {
        self.resolve(name).ok()
    }
}

/// Anything that knows a storage-relative name and the backend holding it.
pub trait StoredFile {
    fn name(&self) -> &str;
    fn storage(&self) -> Arc<dyn Storage>;
}

/// Stock [`StoredFile`]: a name paired with its storage.
#[derive(Debug, Clone)]
pub struct FieldFile {
    pub name: String,
    pub storage: Arc<dyn Storage>,
}

impl FieldFile {
    pub fn new(name: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        Self {
            name: name.into(),
            storage,
        }
    }
}

impl StoredFile for FieldFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }
}
