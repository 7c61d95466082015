// The auth service owns the "cached token or interactive consent" decision.
// It has no idea where tokens are stored, how the user is asked for a code,
// or how the identity provider is reached: those are the three ports below,
// implemented in `infra::google` and faked in the tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::auth_models::{ClientCredentials, OAuthToken};

/// `state` value sent with the consent URL. The code is pasted back by hand,
/// so there is no redirect whose state could be compared against it.
const AUTH_STATE: &str = "state-token";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unable to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid client credentials: {0}")]
    Config(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Unusable token cache: {0}")]
    Cache(String),
}

/// Reads the raw `credentials.json` bytes.
pub async fn load_credentials(path: impl AsRef<Path>) -> Result<Vec<u8>, AuthError> {
    let path = path.as_ref();
    tokio::fs::read(path).await.map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// PORTS
// ============================================================================

/// Persistent storage for the user's token.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Returns `Ok(None)` when nothing has been cached yet.
    async fn load(&self) -> Result<Option<OAuthToken>, AuthError>;

    /// Replaces whatever was cached before.
    async fn save(&self, token: &OAuthToken) -> Result<(), AuthError>;
}

/// Something that can turn a consent URL into an authorization code.
///
/// The console implementation prints the URL and blocks on stdin; tests hand
/// back a preset code or a preset failure.
#[async_trait]
pub trait AuthCodeProvider: Send + Sync {
    async fn authorization_code(&self, auth_url: &str) -> Result<String, AuthError>;
}

/// The identity provider's token endpoint.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn exchange_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
    ) -> Result<OAuthToken, AuthError>;

    async fn refresh(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<OAuthToken, AuthError>;
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct AuthService<C: TokenCache, P: AuthCodeProvider, E: TokenEndpoint> {
    cache: C,
    codes: P,
    endpoint: E,
}

impl<C, P, E> AuthService<C, P, E>
where
    C: TokenCache,
    P: AuthCodeProvider,
    E: TokenEndpoint,
{
    pub fn new(cache: C, codes: P, endpoint: E) -> Self {
        Self {
            cache,
            codes,
            endpoint,
        }
    }

    /// Produces an authenticated session for `scope`, consuming the service.
    pub async fn obtain_session(
        self,
        credentials: ClientCredentials,
        scope: &str,
    ) -> Result<AuthSession<E>, AuthError> {
        let token = self.obtain_token(&credentials, scope).await?;
        Ok(AuthSession::new(credentials, token, self.endpoint))
    }

    /// Returns the cached token if one can be read, otherwise runs the
    /// interactive flow once and caches its result.
    pub async fn obtain_token(
        &self,
        credentials: &ClientCredentials,
        scope: &str,
    ) -> Result<OAuthToken, AuthError> {
        match self.cache.load().await {
            Ok(Some(token)) => {
                tracing::debug!("Using cached OAuth token");
                return Ok(token);
            }
            Ok(None) => tracing::info!("No cached OAuth token, starting authorization"),
            Err(e) => tracing::warn!("Ignoring token cache ({}), starting authorization", e),
        }

        let token = self.interactive_authorize(credentials, scope).await?;
        self.cache.save(&token).await?;
        Ok(token)
    }

    /// Asks the code provider for a code and exchanges it for a token.
    pub async fn interactive_authorize(
        &self,
        credentials: &ClientCredentials,
        scope: &str,
    ) -> Result<OAuthToken, AuthError> {
        let auth_url = credentials.authorization_url(scope, AUTH_STATE)?;

        let code = self.codes.authorization_code(&auth_url).await?;
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::Authorization(
                "no authorization code was entered".to_string(),
            ));
        }

        let token = self.endpoint.exchange_code(credentials, code).await?;
        tracing::info!("Exchanged authorization code for a new token");
        Ok(token)
    }
}

// ============================================================================
// AUTHENTICATED SESSION
// ============================================================================

/// Credentials plus the current token. Every outbound API call asks this for
/// its bearer token, which refreshes the access token on demand.
pub struct AuthSession<E: TokenEndpoint> {
    credentials: ClientCredentials,
    endpoint: E,
    token: RwLock<OAuthToken>,
}

impl<E: TokenEndpoint> AuthSession<E> {
    pub fn new(credentials: ClientCredentials, token: OAuthToken, endpoint: E) -> Self {
        Self {
            credentials,
            endpoint,
            token: RwLock::new(token),
        }
    }

    /// A usable access token.
    ///
    /// An expired token without a refresh token is handed out unchanged and
    /// the API decides whether to accept it.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        {
            let token = self.token.read().await;
            if !token.is_expired(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let mut token = self.token.write().await;
        let Some(refresh_token) = token.refresh_token.clone() else {
            tracing::warn!("Access token has expired and there is no refresh token");
            return Ok(token.access_token.clone());
        };

        let mut refreshed = self
            .endpoint
            .refresh(&self.credentials, &refresh_token)
            .await?;
        // Google only sends a refresh token on the first exchange.
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }
        tracing::info!("Refreshed expired access token");

        *token = refreshed;
        Ok(token.access_token.clone())
    }

    #[cfg(test)]
    pub async fn token(&self) -> OAuthToken {
        self.token.read().await.clone()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
            auth_uri: "https://accounts.example.com/auth".into(),
            token_uri: "https://accounts.example.com/token".into(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".into(),
        }
    }

    /// In-memory cache; `corrupt` makes `load` fail the way a garbled file would.
    #[derive(Clone, Default)]
    struct MemoryCache {
        token: Arc<Mutex<Option<OAuthToken>>>,
        corrupt: bool,
        saves: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TokenCache for MemoryCache {
        async fn load(&self) -> Result<Option<OAuthToken>, AuthError> {
            if self.corrupt {
                return Err(AuthError::Cache("expected value at line 1 column 1".into()));
            }
            Ok(self.token.lock().unwrap().clone())
        }

        async fn save(&self, token: &OAuthToken) -> Result<(), AuthError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.token.lock().unwrap() = Some(token.clone());
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FakeCodes {
        answer: Result<String, String>,
        calls: Arc<AtomicUsize>,
        seen_url: Arc<Mutex<Option<String>>>,
    }

    impl FakeCodes {
        fn returning(code: &str) -> Self {
            Self {
                answer: Ok(code.to_string()),
                calls: Arc::default(),
                seen_url: Arc::default(),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                answer: Err(reason.to_string()),
                calls: Arc::default(),
                seen_url: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl AuthCodeProvider for FakeCodes {
        async fn authorization_code(&self, auth_url: &str) -> Result<String, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_url.lock().unwrap() = Some(auth_url.to_string());
            self.answer.clone().map_err(AuthError::Authorization)
        }
    }

    /// Accepts only the code "good-code" and counts refreshes.
    #[derive(Clone, Default)]
    struct FakeEndpoint {
        refreshes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TokenEndpoint for FakeEndpoint {
        async fn exchange_code(
            &self,
            _credentials: &ClientCredentials,
            code: &str,
        ) -> Result<OAuthToken, AuthError> {
            if code != "good-code" {
                return Err(AuthError::Authorization("invalid_grant".into()));
            }
            Ok(OAuthToken::new(
                "fresh-access",
                Some("fresh-refresh".into()),
                Some(Utc::now() + Duration::hours(1)),
            ))
        }

        async fn refresh(
            &self,
            _credentials: &ClientCredentials,
            refresh_token: &str,
        ) -> Result<OAuthToken, AuthError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(OAuthToken::new(
                format!("refreshed-with-{}", refresh_token),
                None,
                Some(Utc::now() + Duration::hours(1)),
            ))
        }
    }

    #[tokio::test]
    async fn test_cached_token_skips_interactive_flow() {
        let cache = MemoryCache::default();
        let cached = OAuthToken::new("cached", None, None);
        *cache.token.lock().unwrap() = Some(cached.clone());
        let codes = FakeCodes::returning("good-code");

        let service = AuthService::new(cache.clone(), codes.clone(), FakeEndpoint::default());
        let token = service.obtain_token(&credentials(), "scope").await.unwrap();

        assert_eq!(token, cached);
        assert_eq!(codes.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_cache_runs_flow_once_and_persists() {
        let cache = MemoryCache::default();
        let codes = FakeCodes::returning("  good-code\n");

        let service = AuthService::new(cache.clone(), codes.clone(), FakeEndpoint::default());
        let token = service.obtain_token(&credentials(), "scope").await.unwrap();

        assert_eq!(token.access_token, "fresh-access");
        assert_eq!(codes.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.saves.load(Ordering::SeqCst), 1);

        // A second run reads the persisted token instead of prompting again.
        let reloaded = service.obtain_token(&credentials(), "scope").await.unwrap();
        assert_eq!(reloaded, token);
        assert_eq!(codes.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_flow() {
        let cache = MemoryCache {
            corrupt: true,
            ..Default::default()
        };
        let codes = FakeCodes::returning("good-code");

        let service = AuthService::new(cache.clone(), codes.clone(), FakeEndpoint::default());
        let token = service.obtain_token(&credentials(), "scope").await.unwrap();

        assert_eq!(token.access_token, "fresh-access");
        assert_eq!(codes.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.token.lock().unwrap().as_ref().map(|t| t.access_token.clone()),
            Some("fresh-access".to_string())
        );
    }

    #[tokio::test]
    async fn test_consent_url_is_handed_to_provider() {
        let codes = FakeCodes::returning("good-code");
        let service = AuthService::new(
            MemoryCache::default(),
            codes.clone(),
            FakeEndpoint::default(),
        );
        service
            .interactive_authorize(&credentials(), "scope-x")
            .await
            .unwrap();

        let url = codes.seen_url.lock().unwrap().clone().unwrap();
        assert!(url.starts_with("https://accounts.example.com/auth?"));
        assert!(url.contains("scope=scope-x"));
        assert!(url.contains("client_id=client"));
    }

    #[tokio::test]
    async fn test_rejected_code_is_an_authorization_error() {
        let cache = MemoryCache::default();
        let service = AuthService::new(
            cache.clone(),
            FakeCodes::returning("stale-code"),
            FakeEndpoint::default(),
        );

        let err = service.obtain_token(&credentials(), "scope").await.unwrap_err();
        assert!(matches!(err, AuthError::Authorization(_)));
        assert_eq!(cache.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_and_empty_code_abort() {
        let service = AuthService::new(
            MemoryCache::default(),
            FakeCodes::failing("stdin closed"),
            FakeEndpoint::default(),
        );
        let err = service.obtain_token(&credentials(), "scope").await.unwrap_err();
        assert!(matches!(err, AuthError::Authorization(ref m) if m == "stdin closed"));

        let service = AuthService::new(
            MemoryCache::default(),
            FakeCodes::returning("   "),
            FakeEndpoint::default(),
        );
        let err = service.obtain_token(&credentials(), "scope").await.unwrap_err();
        assert!(matches!(err, AuthError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_session_refreshes_expired_token_and_keeps_refresh_token() {
        let endpoint = FakeEndpoint::default();
        let expired = OAuthToken::new(
            "old",
            Some("r1".into()),
            Some(Utc::now() - Duration::minutes(5)),
        );
        let session = AuthSession::new(credentials(), expired, endpoint.clone());

        assert_eq!(session.access_token().await.unwrap(), "refreshed-with-r1");
        assert_eq!(session.token().await.refresh_token.as_deref(), Some("r1"));

        // Now valid, so no second refresh.
        session.access_token().await.unwrap();
        assert_eq!(endpoint.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_without_refresh_token_returns_stale_token() {
        let endpoint = FakeEndpoint::default();
        let expired = OAuthToken::new("old", None, Some(Utc::now() - Duration::minutes(5)));
        let session = AuthSession::new(credentials(), expired, endpoint.clone());

        assert_eq!(session.access_token().await.unwrap(), "old");
        assert_eq!(endpoint.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_credentials(dir.path().join("credentials.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Io { .. }));
    }
}
