use crate::sheets::error::SheetsError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CheckpointError {
    #[error("Checkpoint at {location} is unavailable: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("Failed to write checkpoint to {location}: {source}")]
    WriteFailed {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint {current} cannot advance by {by}.")]
    Overflow { current: u64, by: u64 },

    #[error(transparent)]
    Sheets(#[from] SheetsError),
}
