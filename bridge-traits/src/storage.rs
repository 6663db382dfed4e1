//! File System Abstraction
//!
//! The upload path reads media and thumbnail files through this trait, and
//! media auto-assignment lists the configured media folder with it.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn load_thumbnail(fs: &dyn FileSystemAccess, path: &Path) -> Result<Option<Bytes>> {
///     if !fs.exists(path).await? {
///         return Ok(None);
///     }
///     Ok(Some(fs.read_file(path).await?))
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get file metadata
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Read entire file contents
    ///
    /// Media files are read whole; the upload body is sent in a single request.
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// List the entries of a directory (non-recursive)
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}
