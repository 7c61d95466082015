// Entry point of the docs merge tool.
//
// **Architecture Overview:**
// - `core/` = Auth and document logic, written against traits (ports)
// - `infra/` = Implementations of those traits (Google HTTP APIs, token file, console)
// - `config.rs` = Environment-driven settings
//
// This file's job is to:
// 1. Load configuration
// 2. Obtain an authenticated session (cached token or interactive consent)
// 3. Copy the template document and apply the edit batch to the copy
// 4. Print the batch-update response
//
// Library code only returns errors; the single handler in `main` logs them
// and sets the exit status.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use anyhow::Context;

use crate::config::AppConfig;
use crate::core::auth::{load_credentials, AuthService, ClientCredentials};
use crate::core::docs::DocsService;
use crate::infra::google::{ConsoleCodeProvider, GoogleApiClient, GoogleOAuthClient, TokenFileStore};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // ========================================================================
    // AUTHENTICATION
    // ========================================================================

    let credential_bytes = load_credentials(&config.credentials_path)
        .await
        .context("Unable to read client secret file")?;
    let credentials = ClientCredentials::from_json(&credential_bytes)
        .context("Unable to parse client secret file to config")?;

    let auth = AuthService::new(
        TokenFileStore::new(&config.token_path),
        ConsoleCodeProvider::stdin(),
        GoogleOAuthClient::new(),
    );
    let session = auth
        .obtain_session(credentials, &config.scope)
        .await
        .context("Unable to obtain an OAuth token")?;

    // ========================================================================
    // DOCUMENT OPERATIONS
    // ========================================================================

    let docs = DocsService::new(GoogleApiClient::new(session, config.endpoints.clone()));
    let report = match docs.run(&config.job).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(position) = e.failed_request() {
                tracing::error!(
                    position,
                    "Edit {} of the batch (requests[{}]) was rejected, none of the edits were applied",
                    position + 1,
                    position
                );
            }
            return Err(anyhow::Error::new(e).context(format!(
                "Unable to copy and update document {}",
                config.job.source_id
            )));
        }
    };

    if let Some(outline) = &report.outline {
        println!("{}", outline);
    }

    let response =
        serde_json::to_string_pretty(&report.response).context("Unable to render response")?;
    println!("{}", response);

    tracing::info!(
        copy_id = %report.copy.id,
        "Finished updating '{}'",
        report.copy.name
    );
    Ok(())
}
