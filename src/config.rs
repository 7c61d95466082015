// Runtime configuration. There are no command-line flags: every knob is an
// environment variable (a `.env` file works too), with defaults that copy
// and edit the sample template.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::core::auth::DRIVE_SCOPE;
use crate::core::docs::{DocsJob, EditPlan};
use crate::infra::google::ApiEndpoints;

const DEFAULT_SOURCE_ID: &str = "1F6ye209lFqkg5LHCepvK2vQMDnCuxW_PagasjwWuq5o";
const DEFAULT_COPY_NAME: &str = "merged-output-from-try-gdocs-api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub scope: String,
    pub endpoints: ApiEndpoints,
    pub job: DocsJob,
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; unset or blank values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let string_or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let defaults = EditPlan::default();
        let plan = EditPlan {
            insert_index: parse_or(
                "DOCS_INSERT_INDEX",
                get("DOCS_INSERT_INDEX"),
                "a document index",
                defaults.insert_index,
            )?,
            table_index: parse_or(
                "DOCS_TABLE_INDEX",
                get("DOCS_TABLE_INDEX"),
                "a document index",
                defaults.table_index,
            )?,
            ..defaults
        };

        let defaults = ApiEndpoints::default();
        let endpoints = ApiEndpoints {
            drive: string_or("DOCS_DRIVE_API_URL", &defaults.drive),
            docs: string_or("DOCS_DOCS_API_URL", &defaults.docs),
        };

        Ok(Self {
            credentials_path: PathBuf::from(string_or("DOCS_CREDENTIALS_FILE", "credentials.json")),
            token_path: PathBuf::from(string_or("DOCS_TOKEN_FILE", "token.json")),
            scope: string_or("DOCS_OAUTH_SCOPE", DRIVE_SCOPE),
            endpoints,
            job: DocsJob {
                source_id: string_or("DOCS_SOURCE_ID", DEFAULT_SOURCE_ID),
                copy_name: string_or("DOCS_COPY_NAME", DEFAULT_COPY_NAME),
                plan,
                print_outline: parse_or(
                    "DOCS_PRINT_OUTLINE",
                    get("DOCS_PRINT_OUTLINE"),
                    "true or false",
                    false,
                )?,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}
