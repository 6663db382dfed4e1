//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Media files and thumbnails are addressed by absolute paths stored on the
/// video rows, so no sandbox root is applied.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            is_directory: metadata.is_dir(),
        })
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
            entries.push(entry.path());
        }

        entries.sort();
        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        env::temp_dir().join(format!("channel-studio-fs-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_read_and_metadata() {
        let dir = scratch_dir("read");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("clip.mp4");
        tokio::fs::write(&file, b"fake-video").await.unwrap();

        let fs = TokioFileSystem::new();
        assert!(fs.exists(&file).await.unwrap());

        let data = fs.read_file(&file).await.unwrap();
        assert_eq!(&data[..], b"fake-video");

        let metadata = fs.metadata(&file).await.unwrap();
        assert_eq!(metadata.size, 10);
        assert!(!metadata.is_directory);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_directory_is_sorted() {
        let dir = scratch_dir("list");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("b.mp4"), b"b").await.unwrap();
        tokio::fs::write(dir.join("a.mp4"), b"a").await.unwrap();

        let fs = TokioFileSystem::new();
        let entries = fs.list_directory(&dir).await.unwrap();
        assert_eq!(entries, vec![dir.join("a.mp4"), dir.join("b.mp4")]);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let fs = TokioFileSystem::new();
        let missing = scratch_dir("missing").join("nope.mp4");
        assert!(!fs.exists(&missing).await.unwrap());
        assert!(matches!(
            fs.read_file(&missing).await,
            Err(BridgeError::Io(_))
        ));
    }
}
