//! Form responses as named-field records.

use serde::Serialize;

pub mod row_fetcher;

/// Column positions of the form-response sheet.
///
/// These must match the question order of the form; the sheet is read as
/// columns `A..V`, so every index here stays below 22.
pub mod columns {
    pub const SUBMITTED_AT: usize = 0;
    pub const FIRST_NAME: usize = 1;
    pub const LAST_NAME: usize = 2;
    pub const PRONOUNS: usize = 3;
    pub const YEAR: usize = 4;
    pub const MAJOR: usize = 5;
    pub const INTERESTS: usize = 6;
    pub const CONTACT_PERMISSION: usize = 7;
    pub const EMAIL: usize = 8;
    pub const PHONE: usize = 9;
    pub const COMMENTS: usize = 10;
    pub const CONTACT_CHANNEL: usize = 11;
    pub const PREFERRED_CONTACT: usize = 12;

    /// Rows shorter than this are malformed. Later columns are optional
    /// because the sheet omits trailing empty cells.
    pub const REQUIRED_LEN: usize = EMAIL + 1;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormRowError {
    #[error("Row has {len} cells, missing required column `{column}` (index {index}).")]
    MissingColumn {
        column: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Row has a blank e-mail address.")]
    BlankEmail,
}

/// One form submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormRow {
    pub submitted_at: String,
    pub first_name: String,
    pub last_name: String,
    pub pronouns: String,
    pub year: String,
    pub major: String,
    /// Free text naming the interest groups the respondent picked.
    pub interests: String,
    pub contact_permission: String,
    pub email: String,
    pub phone: String,
    pub comments: String,
    pub contact_channel: String,
    pub preferred_contact: String,
}

impl FormRow {
    /// Maps raw sheet cells to a row, failing on missing required columns.
    pub fn from_cells(cells: &[String]) -> Result<Self, FormRowError> {
        use columns::*;

        const REQUIRED: [(&str, usize); REQUIRED_LEN] = [
            ("submitted_at", SUBMITTED_AT),
            ("first_name", FIRST_NAME),
            ("last_name", LAST_NAME),
            ("pronouns", PRONOUNS),
            ("year", YEAR),
            ("major", MAJOR),
            ("interests", INTERESTS),
            ("contact_permission", CONTACT_PERMISSION),
            ("email", EMAIL),
        ];

        if let Some((column, index)) = REQUIRED.iter().find(|(_, idx)| *idx >= cells.len()) {
            return Err(FormRowError::MissingColumn {
                column: *column,
                index: *index,
                len: cells.len(),
            });
        }

        let cell = |idx: usize| {
            cells
                .get(idx)
                .map(|c| c.trim().to_string())
                .unwrap_or_default()
        };

        let row = Self {
            submitted_at: cell(SUBMITTED_AT),
            first_name: cell(FIRST_NAME),
            last_name: cell(LAST_NAME),
            pronouns: cell(PRONOUNS),
            year: cell(YEAR),
            major: cell(MAJOR),
            interests: cell(INTERESTS),
            contact_permission: cell(CONTACT_PERMISSION),
            email: cell(EMAIL),
            phone: cell(PHONE),
            comments: cell(COMMENTS),
            contact_channel: cell(CONTACT_CHANNEL),
            preferred_contact: cell(PREFERRED_CONTACT),
        };

        if row.email.is_empty() {
            return Err(FormRowError::BlankEmail);
        }
        Ok(row)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl TryFrom<&[String]> for FormRow {
    type Error = FormRowError;

    fn try_from(cells: &[String]) -> Result<Self, Self::Error> {
        Self::from_cells(cells)
    }
}
