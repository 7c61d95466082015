// Domain models for the OAuth2 side of the tool.
// Nothing in here performs I/O: the infra layer reads and writes these,
// the auth service decides what to do with them.

use chrono::{DateTime, Datelike, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::auth_service::AuthError;

/// Full read/write access to Drive, which also covers the Docs API.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are considered expired this long before their stated expiry.
const EXPIRY_DELTA_SECS: i64 = 10;

// ============================================================================
// APPLICATION CREDENTIALS
// ============================================================================

/// Shape of the `credentials.json` file downloaded from the Cloud Console.
/// Desktop clients put their fields under `installed`, web clients under `web`;
/// when both are present `web` wins.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<CredentialsEntry>,
    web: Option<CredentialsEntry>,
}

#[derive(Debug, Deserialize)]
struct CredentialsEntry {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// OAuth client registration, immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    /// First registered redirect URI.
    pub redirect_uri: String,
}

impl ClientCredentials {
    /// Parses the raw bytes of a `credentials.json` file.
    pub fn from_json(bytes: &[u8]) -> Result<Self, AuthError> {
        let file: CredentialsFile = serde_json::from_slice(bytes)
            .map_err(|e| AuthError::Config(format!("credentials file is not valid JSON: {}", e)))?;

        let entry = file.web.or(file.installed).ok_or_else(|| {
            AuthError::Config("credentials file has neither an `installed` nor a `web` client".into())
        })?;

        if entry.client_id.trim().is_empty() {
            return Err(AuthError::Config("client_id is empty".into()));
        }

        let redirect_uri = entry.redirect_uris.into_iter().next().ok_or_else(|| {
            AuthError::Config("missing redirect URL in the credentials file".into())
        })?;

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            auth_uri: entry.auth_uri.unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
            token_uri: entry.token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
            redirect_uri,
        })
    }

    /// Builds the consent URL the user opens in a browser.
    ///
    /// `access_type=offline` asks Google for a refresh token alongside the access token.
    pub fn authorization_url(&self, scope: &str, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.auth_uri,
            &[
                ("access_type", "offline"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Config(format!("invalid auth_uri {}: {}", self.auth_uri, e)))?;

        Ok(url.into())
    }
}

// ============================================================================
// USER TOKEN
// ============================================================================

/// A user's OAuth token as stored in `token.json`.
///
/// Field names follow the de-facto layout Google's client libraries write,
/// so a token file produced by another tool loads without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token stops working. `None` means unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuthToken {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token,
            expiry,
        }
    }

    /// Whether the access token should be refreshed before use at `now`.
    ///
    /// A zero timestamp (year 1) is what other clients write for "no expiry".
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) if expiry.year() > 1 => {
                now + Duration::seconds(EXPIRY_DELTA_SECS) >= expiry
            }
            _ => false,
        }
    }
}
