//! Persistence of the processed-row offset.
//!
//! The stores assume a single active writer. Two overlapping runs would both
//! read the same offset and race on the write, so scheduling must guarantee
//! that runs never overlap.

use async_trait::async_trait;

use crate::checkpoint::error::CheckpointError;

pub mod error;
pub mod file_store;
pub mod sheet_store;

/// Sheet row number where the next batch starts.
pub type Checkpoint = u64;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Reads the stored offset. Fails with [`CheckpointError::Unavailable`]
    /// when the backing is missing, empty, not a number or `0` (sheet rows
    /// are numbered from 1).
    async fn read(&self) -> Result<Checkpoint, CheckpointError>;

    /// Overwrites the stored offset.
    async fn write(&self, value: Checkpoint) -> Result<(), CheckpointError>;

    /// Reads the stored offset, persists `current + by` and returns it.
    async fn advance(&self, by: u64) -> Result<Checkpoint, CheckpointError> {
        let current = self.read().await?;
        self.advance_from(current, by).await
    }

    /// Persists `current + by` for a `current` the caller already read.
    async fn advance_from(
        &self,
        current: Checkpoint,
        by: u64,
    ) -> Result<Checkpoint, CheckpointError> {
        let next = current
            .checked_add(by)
            .ok_or(CheckpointError::Overflow { current, by })?;
        self.write(next).await?;
        Ok(next)
    }

    /// Human readable location, used in logs.
    fn location(&self) -> String;
}

pub(crate) fn parse_checkpoint(raw: &str, location: &str) -> Result<Checkpoint, CheckpointError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CheckpointError::Unavailable {
            location: location.to_string(),
            reason: "empty".to_string(),
        });
    }
    let value = raw
        .parse::<Checkpoint>()
        .map_err(|e| CheckpointError::Unavailable {
            location: location.to_string(),
            reason: format!("`{raw}` is not a row number ({e})"),
        })?;
    if value == 0 {
        return Err(CheckpointError::Unavailable {
            location: location.to_string(),
            reason: "row numbers start at 1".to_string(),
        });
    }
    Ok(value)
}
