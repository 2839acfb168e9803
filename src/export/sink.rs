//! Delivery of finished archives.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::ExportError;
use super::filename::resolve_unique_path;

/// Receives a finished archive.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Delivers `bytes` under `file_name` and returns where it went.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Delivery`] if the archive cannot be stored.
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError>;
}

/// Writes archives into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArchiveSink for DirectorySink {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ExportError::Delivery {
                path: self.dir.clone(),
                source,
            })?;
        let path = resolve_unique_path(&self.dir, file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| ExportError::Delivery {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "archive written");
        Ok(path)
    }
}
