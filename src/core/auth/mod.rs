// OAuth2 token acquisition and caching.
// - `auth_models.rs` holds the credential and token types.
// - `auth_service.rs` decides between the cached token and interactive consent.

pub mod auth_models;
pub mod auth_service;

pub use auth_models::{ClientCredentials, OAuthToken, DRIVE_SCOPE};
pub use auth_service::{
    load_credentials, AuthCodeProvider, AuthError, AuthService, AuthSession, TokenCache,
    TokenEndpoint,
};
