//! Reads the next window of form responses.

use std::sync::Arc;

use log::debug;
use log::info;

use crate::checkpoint::Checkpoint;
use crate::form::FormRow;
use crate::form::FormRowError;
use crate::sheets::SpreadsheetStore;
use crate::sheets::error::SheetsError;

/// Rows fetched in one run, in sheet order.
#[derive(Debug, Default)]
pub struct Batch {
    /// Sheet row number of the first row.
    pub offset: Checkpoint,
    pub rows: Vec<Result<FormRow, FormRowError>>,
}

impl Batch {
    /// Number of sheet rows consumed, malformed ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct RowFetcher {
    sheets: Arc<dyn SpreadsheetStore>,
    sheet_name: String,
}

impl RowFetcher {
    pub fn new(sheets: Arc<dyn SpreadsheetStore>, sheet_name: impl Into<String>) -> Self {
        Self {
            sheets,
            sheet_name: sheet_name.into(),
        }
    }

    /// Builds `<SheetName>!A<offset>:V<offset + max_rows>`.
    ///
    /// The end row is inclusive, so a window spans `max_rows + 1` rows.
    pub fn range_for(&self, offset: Checkpoint, max_rows: u64) -> String {
        format!(
            "{}!A{}:V{}",
            self.sheet_name,
            offset,
            offset.saturating_add(max_rows)
        )
    }

    /// Fetches the rows starting at `offset`. An empty batch means no new
    /// responses.
    pub async fn fetch(&self, offset: Checkpoint, max_rows: u64) -> Result<Batch, SheetsError> {
        let range = self.range_for(offset, max_rows);
        debug!("Fetching form responses in range {range}");

        let cells = self.sheets.get_range(&range).await?;
        let rows: Vec<_> = cells
            .iter()
            .map(|row| FormRow::from_cells(row))
            .collect();
        info!("Fetched {} rows starting at row {offset}.", rows.len());

        Ok(Batch { offset, rows })
    }
}
