//! Local filesystem storage implementation.
//!
//! Writes go to a temporary sibling file that is then renamed over the
//! target, so readers see either the old or the new store, never a partial
//! one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{RecordSet, WordStorage, WriteMetadata, parse_store_json, to_store_json};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage for the given store file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl WordStorage for LocalStorage {
    async fn load(&self) -> Result<RecordSet> {
        match self.read_bytes().await? {
            Some(bytes) => {
                let records = parse_store_json(&bytes, &self.location())?;
                log::debug!("Loaded {} entries from {}", records.len(), self.location());
                Ok(records)
            }
            None => {
                log::warn!("No word store at {}, starting empty", self.location());
                Ok(RecordSet::new())
            }
        }
    }

    async fn save(&self, records: &RecordSet) -> Result<WriteMetadata> {
        let json = to_store_json(records)?;
        self.write_bytes(json.as_bytes()).await?;
        log::debug!("Wrote {} entries to {}", records.len(), self.location());

        Ok(WriteMetadata {
            entry_count: records.len(),
            location: self.location(),
            timestamp: Utc::now(),
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
