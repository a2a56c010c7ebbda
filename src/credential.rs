//! Bearer-token providers for the spreadsheet and chat APIs.
//!
//! Obtaining and refreshing tokens is left to external tooling; a provider only
//! hands out the current token and remembers when a service rejected it.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;
use log::warn;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CredentialError {
    #[error("Failed to read token from `{path}`: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token file `{path}` is empty.")]
    Empty { path: String },

    #[error("Token from {origin} was rejected by the service.")]
    Rejected { origin: String },
}

/// Supplies opaque bearer tokens.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a token that has not been rejected yet.
    async fn token(&self) -> Result<String, CredentialError>;

    /// Marks `token` as rejected so it is not handed out again.
    fn invalidate(&self, token: &str);
}

/// A fixed token, e.g. one injected through the environment.
pub struct StaticTokenProvider {
    token: String,
    rejected: Mutex<bool>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            rejected: Mutex::new(false),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String, CredentialError> {
        if *self.rejected.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(CredentialError::Rejected {
                origin: "static configuration".to_string(),
            });
        }
        Ok(self.token.clone())
    }

    fn invalidate(&self, token: &str) {
        if token == self.token {
            *self.rejected.lock().unwrap_or_else(|e| e.into_inner()) = true;
        }
    }
}

/// Reads the token from a file on every call, so an external refresher can
/// rotate it between runs.
pub struct FileTokenProvider {
    path: PathBuf,
    rejected: Mutex<Option<String>>,
}

impl FileTokenProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rejected: Mutex::new(None),
        }
    }

    fn path_str(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

#[async_trait]
impl CredentialProvider for FileTokenProvider {
    async fn token(&self) -> Result<String, CredentialError> {
        debug!("Reading token from {}", self.path_str());
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CredentialError::ReadFailed {
                path: self.path_str(),
                source,
            })?;

        let token = raw.trim().to_string();
        if token.is_empty() {
            return Err(CredentialError::Empty {
                path: self.path_str(),
            });
        }

        let rejected = self.rejected.lock().unwrap_or_else(|e| e.into_inner());
        if rejected.as_deref() == Some(token.as_str()) {
            return Err(CredentialError::Rejected {
                origin: self.path_str(),
            });
        }
        Ok(token)
    }

    fn invalidate(&self, token: &str) {
        warn!(
            "Token from {} was rejected; it will not be reused until the file changes.",
            self.path_str()
        );
        *self.rejected.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("signup-sync-token-{}.txt", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_static_token_until_invalidated() {
        let provider = StaticTokenProvider::new("xoxb-1");
        assert_eq!(provider.token().await.unwrap(), "xoxb-1");

        provider.invalidate("something-else");
        assert!(provider.token().await.is_ok());

        provider.invalidate("xoxb-1");
        assert!(matches!(
            provider.token().await,
            Err(CredentialError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_token_is_trimmed_and_rotates() {
        let path = temp_path();
        std::fs::write(&path, "  token-a\n").unwrap();
        let provider = FileTokenProvider::new(&path);

        assert_eq!(provider.token().await.unwrap(), "token-a");

        provider.invalidate("token-a");
        assert!(matches!(
            provider.token().await,
            Err(CredentialError::Rejected { .. })
        ));

        std::fs::write(&path, "token-b").unwrap();
        assert_eq!(provider.token().await.unwrap(), "token-b");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_file_token_missing_or_empty() {
        let path = temp_path();
        let provider = FileTokenProvider::new(&path);
        assert!(matches!(
            provider.token().await,
            Err(CredentialError::ReadFailed { .. })
        ));

        std::fs::write(&path, "\n").unwrap();
        assert!(matches!(
            provider.token().await,
            Err(CredentialError::Empty { .. })
        ));
        let _ = std::fs::remove_file(path);
    }
}
