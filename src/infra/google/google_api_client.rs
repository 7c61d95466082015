// Authenticated HTTP client for the two Google APIs the tool uses:
// Drive v3 (copying the template) and Docs v1 (reading and batch-editing).
// Every request pulls its bearer token from the `AuthSession`, so an expired
// access token is refreshed right before the call that needs it.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::auth::{AuthSession, TokenEndpoint};
use crate::core::docs::{
    BatchUpdateRequest, BatchUpdateResponse, CopyFileRequest, DocsError, Document, DocumentApi,
    DriveFile, EditOperation,
};

pub const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DOCS_API_URL: &str = "https://docs.googleapis.com/v1";

/// Base URLs of the Drive and Docs APIs. Overridable so the client can be
/// pointed at a local stand-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub drive: String,
    pub docs: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            drive: DRIVE_API_URL.to_string(),
            docs: DOCS_API_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    fn copy_url(&self, source_id: &str) -> String {
        format!("{}/files/{}/copy", self.drive.trim_end_matches('/'), source_id)
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}", self.docs.trim_end_matches('/'), document_id)
    }

    fn batch_update_url(&self, document_id: &str) -> String {
        format!("{}:batchUpdate", self.document_url(document_id))
    }
}

/// Google's JSON error envelope: `{"error": {"code": 403, "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(ApiErrorEnvelope {
            error:
                ApiErrorBody {
                    message,
                    status: Some(status),
                },
        }) => format!("{} [{}]", message, status),
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

pub struct GoogleApiClient<E: TokenEndpoint> {
    client: Client,
    session: AuthSession<E>,
    endpoints: ApiEndpoints,
}

impl<E: TokenEndpoint> GoogleApiClient<E> {
    pub fn new(session: AuthSession<E>, endpoints: ApiEndpoints) -> Self {
        Self {
            client: Client::new(),
            session,
            endpoints,
        }
    }

    /// Authenticates and sends `request`, decoding a JSON success body.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, DocsError> {
        let token = self.session.access_token().await?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DocsError::Transport {
                operation,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(operation, status = status.as_u16(), "Remote error body: {}", text);
            return Err(DocsError::Remote {
                operation,
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        response.json::<T>().await.map_err(|e| DocsError::Transport {
            operation,
            message: format!("unexpected response body: {}", e),
        })
    }
}

#[async_trait]
impl<E: TokenEndpoint> DocumentApi for GoogleApiClient<E> {
    async fn copy_file(&self, source_id: &str, new_name: &str) -> Result<DriveFile, DocsError> {
        let url = self.endpoints.copy_url(source_id);
        tracing::debug!("POST {}", url);

        let request = self
            .client
            .post(&url)
            .query(&[("supportsAllDrives", "true"), ("fields", "id,name,mimeType")])
            .json(&CopyFileRequest { name: new_name });

        self.send("files.copy", request).await
    }

    async fn get_document(&self, document_id: &str) -> Result<Document, DocsError> {
        let url = self.endpoints.document_url(document_id);
        tracing::debug!("GET {}", url);

        self.send("documents.get", self.client.get(&url)).await
    }

    async fn batch_update(
        &self,
        document_id: &str,
        edits: &[EditOperation],
    ) -> Result<BatchUpdateResponse, DocsError> {
        let url = self.endpoints.batch_update_url(document_id);
        tracing::debug!("POST {} ({} requests)", url, edits.len());

        let request = self
            .client
            .post(&url)
            .json(&BatchUpdateRequest { requests: edits });

        self.send("documents.batchUpdate", request).await
    }
}
