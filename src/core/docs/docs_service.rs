// The document driver: copy a template, build the edit batch, submit it.
// Like the auth service it only talks to a port (`DocumentApi`), so the
// whole sequence can be exercised against an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use super::docs_models::{BatchUpdateResponse, Document, DriveFile, EditOperation, EditPlan};
use super::outline::render_outline;
use crate::core::auth::AuthError;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DocsError {
    /// The service answered with a non-success status.
    #[error("{operation} failed (HTTP {status}): {message}")]
    Remote {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The request never got an answer (DNS, TLS, connection reset, bad body).
    #[error("{operation} request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl DocsError {
    /// Position of the rejected request inside a batch, when the service
    /// names one (`Invalid requests[1].insertTableRow: ...`).
    pub fn failed_request(&self) -> Option<usize> {
        let Self::Remote { message, .. } = self else {
            return None;
        };
        let start = message.find("requests[")? + "requests[".len();
        let digits: String = message[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

// ============================================================================
// PORT
// ============================================================================

/// The Drive and Docs endpoints this tool uses.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn copy_file(&self, source_id: &str, new_name: &str) -> Result<DriveFile, DocsError>;

    async fn get_document(&self, document_id: &str) -> Result<Document, DocsError>;

    /// Applies every edit or none of them.
    async fn batch_update(
        &self,
        document_id: &str,
        edits: &[EditOperation],
    ) -> Result<BatchUpdateResponse, DocsError>;
}

// ============================================================================
// BATCH CONSTRUCTION
// ============================================================================

/// Builds the edit batch for `plan`.
///
/// Order matters: the batch is applied top to bottom, and inserting text
/// shifts everything after it. Offset-based edits therefore go from the end of
/// the document toward the start, and content-matched replacements go last.
pub fn build_batch_edits(plan: &EditPlan) -> Vec<EditOperation> {
    let mut edits = vec![
        EditOperation::insert_text(plan.insert_index, plan.insert_text.clone()),
        EditOperation::insert_table_row_below(plan.table_index, 0, 0),
    ];

    edits.extend(
        plan.replacements
            .iter()
            .map(|r| EditOperation::replace_all(r.find.clone(), r.replace.clone())),
    );

    edits
}

/// Positions of offset-based edits that target a later offset than some
/// earlier offset-based edit, and so may land somewhere unintended.
pub fn offset_ordering_violations(edits: &[EditOperation]) -> Vec<usize> {
    let mut lowest_so_far: Option<i64> = None;
    let mut violations = Vec::new();

    for (position, edit) in edits.iter().enumerate() {
        let Some(index) = edit.target_index() else {
            continue;
        };
        match lowest_so_far {
            Some(lowest) if index > lowest => violations.push(position),
            Some(lowest) => lowest_so_far = Some(lowest.min(index)),
            None => lowest_so_far = Some(index),
        }
    }

    violations
}

// ============================================================================
// SERVICE
// ============================================================================

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct DocsJob {
    pub source_id: String,
    pub copy_name: String,
    pub plan: EditPlan,
    /// Fetch the copy and render its outline before editing.
    pub print_outline: bool,
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub copy: DriveFile,
    pub outline: Option<String>,
    pub response: BatchUpdateResponse,
}

pub struct DocsService<A: DocumentApi> {
    api: A,
}

impl<A: DocumentApi> DocsService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn copy_document(
        &self,
        source_id: &str,
        new_name: &str,
    ) -> Result<DriveFile, DocsError> {
        let file = self.api.copy_file(source_id, new_name).await?;
        tracing::info!(
            source_id,
            copy_id = %file.id,
            "Copied document to '{}'",
            file.name
        );
        Ok(file)
    }

    pub async fn read_document(&self, document_id: &str) -> Result<Document, DocsError> {
        let document = self.api.get_document(document_id).await?;
        tracing::debug!(
            document_id = %document.document_id,
            "Fetched document '{}'",
            document.title
        );
        Ok(document)
    }

    /// Submits `edits` as one atomic batch.
    ///
    /// Edits are sent in the order given. Offset ordering problems are logged,
    /// never corrected.
    pub async fn submit_batch(
        &self,
        document_id: &str,
        edits: &[EditOperation],
    ) -> Result<BatchUpdateResponse, DocsError> {
        for position in offset_ordering_violations(edits) {
            tracing::warn!(
                position,
                kind = edits[position].kind(),
                "Edit targets an offset after an earlier edit; earlier inserts may shift it"
            );
        }

        let response = self.api.batch_update(document_id, edits).await?;
        tracing::info!(
            document_id,
            replies = response.replies.len(),
            occurrences_changed = response.occurrences_changed(),
            "Applied batch update"
        );
        Ok(response)
    }

    /// Copy, optionally inspect, then edit the copy.
    pub async fn run(&self, job: &DocsJob) -> Result<JobReport, DocsError> {
        let copy = self.copy_document(&job.source_id, &job.copy_name).await?;

        let outline = if job.print_outline {
            let document = self.read_document(&copy.id).await?;
            Some(render_outline(&document))
        } else {
            None
        };

        let edits = build_batch_edits(&job.plan);
        let response = self.submit_batch(&copy.id, &edits).await?;

        Ok(JobReport {
            copy,
            outline,
            response,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
