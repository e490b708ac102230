use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::CmsError;

/// Source of record bodies referenced through `content_file`.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, directory: Option<&Path>, filename: &str) -> Result<String, CmsError>;
}

/// Reads content files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsContentLoader;

/// Join `directory` and `filename` with exactly one separator between them.
pub fn content_path(directory: Option<&Path>, filename: &str) -> PathBuf {
    match directory {
        Some(dir) => {
            let dir = dir.to_string_lossy();
            let dir = dir.trim_end_matches('/');
            let name = filename.trim_start_matches('/');
            PathBuf::from(format!("{}/{}", dir, name))
        }
        None => PathBuf::from(filename),
    }
}

#[async_trait]
impl ContentLoader for FsContentLoader {
    async fn load(&self, directory: Option<&Path>, filename: &str) -> Result<String, CmsError> {
        let path = content_path(directory, filename);
        let is_file = fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(CmsError::ContentFileNotFound {
                filename: filename.to_string(),
            });
        }
        fs::read_to_string(&path)
            .await
            .map_err(|source| CmsError::Io { path, source })
    }
}
