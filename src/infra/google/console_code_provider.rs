use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use crate::core::auth::{AuthCodeProvider, AuthError};

/// Prints the consent URL and reads the pasted authorization code from a
/// line-oriented reader (stdin in production).
pub struct ConsoleCodeProvider<R> {
    input: Mutex<R>,
}

impl ConsoleCodeProvider<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> ConsoleCodeProvider<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

#[async_trait]
impl<R> AuthCodeProvider for ConsoleCodeProvider<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn authorization_code(&self, auth_url: &str) -> Result<String, AuthError> {
        println!(
            "Go to the following link in your browser then type the authorization code: \n{}",
            auth_url
        );

        let mut line = String::new();
        let read = self
            .input
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|e| {
                AuthError::Authorization(format!("unable to read authorization code: {}", e))
            })?;

        if read == 0 {
            return Err(AuthError::Authorization(
                "input closed before an authorization code was entered".to_string(),
            ));
        }

        Ok(line.trim().to_string())
    }
}
