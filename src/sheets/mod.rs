//! Spreadsheet store access.

use async_trait::async_trait;
use serde_json::Value;

use crate::sheets::error::SheetsError;

pub mod error;
pub mod google_sheets;

/// A rectangular block of cells, row-major. Rows may be ragged because the
/// service drops trailing empty cells.
pub type CellBlock = Vec<Vec<String>>;

/// Range-addressed read/write access to a spreadsheet.
///
/// Ranges use sheet-qualified A1 notation, e.g. `Form Responses 1!A2:V102`.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Reads a range. Returns an empty block when the range holds no values.
    async fn get_range(&self, range: &str) -> Result<CellBlock, SheetsError>;

    /// Overwrites a range with raw string values.
    async fn update_range(&self, range: &str, values: CellBlock) -> Result<(), SheetsError>;
}

/// Renders a JSON cell as the string the sheet would display.
pub(crate) fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&json!("Ada")), "Ada");
        assert_eq!(cell_to_string(&json!(2027)), "2027");
        assert_eq!(cell_to_string(&json!(true)), "true");
        assert_eq!(cell_to_string(&Value::Null), "");
    }
}
