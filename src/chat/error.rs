use crate::credential::CredentialError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("Chat API method `{method}` failed: {error}")]
    ApiError { method: String, error: String },

    #[error("Invalid data from API: missing field `{field}`.")]
    MissingField { field: String },

    #[error("No chat user found for e-mail `{email}`.")]
    UserNotFound { email: String },

    #[error("No channel named `{name}` found.")]
    ChannelNotFound { name: String },

    #[error("Failed to post message: {reason}")]
    PostFailed { reason: String },

    #[error("Chat API rejected the access token ({error}).")]
    Unauthorized { error: String },

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl From<wreq::Error> for ChatError {
    fn from(e: wreq::Error) -> Self {
        ChatError::RequestFailed(Box::new(e))
    }
}
