use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::core::auth::{AuthError, OAuthToken, TokenCache};

/// Caches the user's token as a JSON file readable only by its owner.
pub struct TokenFileStore {
    path: PathBuf,
}

impl TokenFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn io_error(&self, source: std::io::Error) -> AuthError {
        AuthError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl TokenCache for TokenFileStore {
    async fn load(&self) -> Result<Option<OAuthToken>, AuthError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let token: OAuthToken = serde_json::from_str(&text)
            .map_err(|e| AuthError::Cache(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(token))
    }

    async fn save(&self, token: &OAuthToken) -> Result<(), AuthError> {
        tracing::info!("Saving credential file to: {}", self.path.display());

        let text = serde_json::to_string(token)
            .map_err(|e| AuthError::Cache(format!("cannot serialize token: {}", e)))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(b"\n").await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))
    }
}
