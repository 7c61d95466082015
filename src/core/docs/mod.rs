// Document copy and batch-edit driver.
// - `docs_models.rs` mirrors the Drive/Docs JSON resources and edit requests.
// - `docs_service.rs` sequences copy -> build batch -> submit.
// - `outline.rs` renders a fetched document for inspection.

pub mod docs_models;
pub mod docs_service;
pub mod outline;

pub use docs_models::{
    BatchUpdateRequest, BatchUpdateResponse, CopyFileRequest, Document, DriveFile, EditOperation,
    EditPlan,
};
pub use docs_service::{DocsError, DocsJob, DocsService, DocumentApi};
