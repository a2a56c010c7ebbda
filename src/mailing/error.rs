#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MailingError {
    #[error("Cannot derive the API host from the API key; expected a `-<datacenter>` suffix.")]
    InvalidApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuildFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<wreq::Error> for MailingError {
    fn from(e: wreq::Error) -> Self {
        MailingError::ClientBuildFailed(Box::new(e))
    }
}
