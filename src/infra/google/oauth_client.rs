use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::core::auth::{AuthError, ClientCredentials, OAuthToken, TokenEndpoint};

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>) -> OAuthToken {
        let mut token = OAuthToken::new(
            self.access_token,
            self.refresh_token,
            self.expires_in.map(|secs| now + Duration::seconds(secs)),
        );
        if let Some(token_type) = self.token_type {
            token.token_type = token_type;
        }
        token
    }
}

/// Error body of a rejected token request, e.g. `{"error": "invalid_grant"}`.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Talks to the token endpoint named in the client credentials.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: Client,
}

impl GoogleOAuthClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn request_token(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<OAuthToken, AuthError> {
        tracing::debug!("Requesting token from {}", token_uri);

        let response = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Authorization(format!("token request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Authorization(format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(AuthError::Authorization(describe_rejection(status.as_u16(), &text)));
        }

        parse_token_response(&text, Utc::now())
    }
}

impl Default for GoogleOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_token_response(body: &str, now: DateTime<Utc>) -> Result<OAuthToken, AuthError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::Authorization(format!("invalid token response: {}", e)))?;
    Ok(parsed.into_token(now))
}

fn describe_rejection(status: u16, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("token endpoint returned {} ({}): {}", status, error, description),
        Ok(TokenErrorResponse { error, .. }) => {
            format!("token endpoint returned {} ({})", status, error)
        }
        Err(_) => format!("token endpoint returned {}: {}", status, body),
    }
}

#[async_trait]
impl TokenEndpoint for GoogleOAuthClient {
    async fn exchange_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
    ) -> Result<OAuthToken, AuthError> {
        tracing::info!("Exchanging authorization code for tokens");
        self.request_token(
            &credentials.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
            ],
        )
        .await
    }

    async fn refresh(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<OAuthToken, AuthError> {
        tracing::info!("Refreshing access token");
        self.request_token(
            &credentials.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ],
        )
        .await
    }
}
