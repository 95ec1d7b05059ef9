//! File operations

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::errors::SimulatorError;

/// A file on disk, addressed by path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    /// Read and deserialize JSON contents
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, SimulatorError> {
        let contents = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Serialize `value` as pretty JSON, creating parent directories
    pub async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), SimulatorError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(value)?;
        fs::write(&self.path, contents).await?;
        Ok(())
    }
}
