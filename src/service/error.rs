use crate::chat::error::ChatError;
use crate::checkpoint::error::CheckpointError;
use crate::notify::error::NotifyError;
use crate::sheets::error::SheetsError;

/// Failures that abort a run. The checkpoint is never advanced after one.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Failed to fetch form responses: {0}")]
    FetchFailed(#[source] SheetsError),

    #[error("Failed to compose notification: {0}")]
    Notify(#[from] NotifyError),

    #[error("Chat notification failed: {0}")]
    Chat(#[from] ChatError),
}
