#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("Failed to read interest groups from `{path}`: {source}")]
    DirectoryReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid interest group file `{path}`: {source}")]
    DirectoryParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to render notification: {0}")]
    RenderFailed(#[from] minijinja::Error),
}
