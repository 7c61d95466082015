// Google infra layer.
// - `oauth_client.rs` talks to the OAuth2 token endpoint.
// - `token_file_store.rs` caches the user token on disk.
// - `console_code_provider.rs` asks the user for an authorization code.
// - `google_api_client.rs` calls Drive and Docs with the session's token.
// - `loopback_server.rs` (tests) answers one HTTP request with a canned reply.

#[path = "oauth_client.rs"]
pub mod oauth_client;

#[path = "token_file_store.rs"]
pub mod token_file_store;

#[path = "console_code_provider.rs"]
pub mod console_code_provider;

#[path = "google_api_client.rs"]
pub mod google_api_client;

#[cfg(test)]
#[path = "loopback_server.rs"]
mod loopback_server;

pub use console_code_provider::ConsoleCodeProvider;
pub use google_api_client::{ApiEndpoints, GoogleApiClient};
pub use oauth_client::GoogleOAuthClient;
pub use token_file_store::TokenFileStore;
