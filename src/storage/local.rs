//! Local filesystem state store.
//!
//! Writes go to a temporary sibling file first and are renamed into place,
//! so an interrupted run never leaves a half-written state behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::State;
use crate::storage::StateStore;
use crate::storage::legacy::parse_state;

/// State store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    /// Create a store for the given state file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read and parse the stored state, surfacing every failure.
    pub async fn try_load(&self) -> Result<Option<State>> {
        match self.read_bytes().await? {
            Some(bytes) => parse_state(&bytes)
                .map(Some)
                .map_err(|e| AppError::state(&self.path, e)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Option<State> {
        match self.try_load().await {
            Ok(Some(state)) => {
                log::debug!(
                    "Loaded previous state with {} snapshots from {}",
                    state.snapshots.len(),
                    self.path.display()
                );
                Some(state)
            }
            Ok(None) => {
                log::info!("No previous state at {}", self.path.display());
                None
            }
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable state file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    async fn save(&self, state: &State) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        self.write_bytes(&bytes).await?;
        log::debug!("State written to {}", self.path.display());
        Ok(())
    }
}
