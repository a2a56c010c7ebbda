use crate::credential::CredentialError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SheetsError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("Spreadsheet API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid spreadsheet API URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Spreadsheet API rejected the access token.")]
    Unauthorized,

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl From<wreq::Error> for SheetsError {
    fn from(e: wreq::Error) -> Self {
        SheetsError::RequestFailed(Box::new(e))
    }
}
