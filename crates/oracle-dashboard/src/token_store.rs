//! File-backed storage for the current login.

use oracle_core::AuthToken;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode token: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when nobody is logged in. An unreadable file counts as logged out.
    pub async fn load(&self) -> Result<Option<AuthToken>, TokenStoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, token: &AuthToken) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let encoded = serde_json::to_vec_pretty(token)?;
        tokio::fs::write(&self.path, encoded).await?;
        Ok(())
    }

    /// Removing a token that was never saved is not an error.
    pub async fn clear(&self) -> Result<(), TokenStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
