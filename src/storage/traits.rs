//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::url::ResourceKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Output root {path} is not writable: {source}")]
    Unwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is a directory; cannot store a file there")]
    PathConflict { path: PathBuf },

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Implementations are shared by every worker and must tolerate concurrent
/// `save` calls for different URLs.
pub trait Storage: Send + Sync {
    /// Persists the payload of a URL and returns where it was written
    ///
    /// Saving the same URL again overwrites the previous payload.
    fn save(&self, url: &Url, bytes: &[u8], kind: ResourceKind) -> StorageResult<PathBuf>;

    /// Root directory that everything is stored under
    fn root(&self) -> &Path;
}
