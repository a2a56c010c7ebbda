//! Checkpoint kept in a local text file.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;

use crate::checkpoint::Checkpoint;
use crate::checkpoint::CheckpointStore;
use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::parse_checkpoint;

pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn read(&self) -> Result<Checkpoint, CheckpointError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CheckpointError::Unavailable {
                location: self.location(),
                reason: match e.kind() {
                    ErrorKind::NotFound => "file does not exist".to_string(),
                    _ => e.to_string(),
                },
            })?;
        parse_checkpoint(&raw, &self.location())
    }

    async fn write(&self, value: Checkpoint) -> Result<(), CheckpointError> {
        // A crash leaves either the old or the new value, never a partial one.
        let temp = self.temp_path();
        let write_failed = |source| CheckpointError::WriteFailed {
            location: self.location(),
            source,
        };
        tokio::fs::write(&temp, value.to_string())
            .await
            .map_err(write_failed)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(write_failed)?;
        debug!("Checkpoint {} written to {}", value, self.location());
        Ok(())
    }

    fn location(&self) -> String {
        format!("file `{}`", self.path.to_string_lossy())
    }
}
