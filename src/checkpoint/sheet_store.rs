//! Checkpoint kept in a reserved cell of the spreadsheet itself.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::checkpoint::Checkpoint;
use crate::checkpoint::CheckpointStore;
use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::parse_checkpoint;
use crate::sheets::SpreadsheetStore;

pub struct SheetCellCheckpointStore {
    sheets: Arc<dyn SpreadsheetStore>,
    /// Single-cell range such as `Checkpoint!A1`.
    cell: String,
}

impl SheetCellCheckpointStore {
    pub fn new(sheets: Arc<dyn SpreadsheetStore>, cell: impl Into<String>) -> Self {
        Self {
            sheets,
            cell: cell.into(),
        }
    }
}

#[async_trait]
impl CheckpointStore for SheetCellCheckpointStore {
    async fn read(&self) -> Result<Checkpoint, CheckpointError> {
        let values = self.sheets.get_range(&self.cell).await?;
        let raw = values
            .first()
            .and_then(|row| row.first())
            .map(String::as_str)
            .unwrap_or_default();
        parse_checkpoint(raw, &self.location())
    }

    async fn write(&self, value: Checkpoint) -> Result<(), CheckpointError> {
        self.sheets
            .update_range(&self.cell, vec![vec![value.to_string()]])
            .await?;
        debug!("Checkpoint {} written to {}", value, self.location());
        Ok(())
    }

    fn location(&self) -> String {
        format!("cell `{}`", self.cell)
    }
}
