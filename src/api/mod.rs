//! Object service collaborators
//!
//! - `types`: request/response payloads
//! - `client`: reqwest implementation of [`ObjectApi`]

mod client;
mod types;

use crate::error::TransferResult;
use crate::store::{ExportJob, UploadFile};
use async_trait::async_trait;

pub use client::HttpObjectApi;
pub use types::{ExportArtifact, ObjectMetadata, ObjectPayload, ObjectRecord, UploadedFile};

/// Everything the orchestrator needs from the server. Any call may fail.
#[async_trait]
pub trait ObjectApi: Send + Sync {
    /// Store raw bytes, returning the original and thumbnail paths.
    async fn upload(&self, file: &UploadFile) -> TransferResult<UploadedFile>;

    /// Persist metadata bound to previously uploaded paths.
    async fn add_object(&self, metadata: &ObjectMetadata) -> TransferResult<ObjectRecord>;

    /// Start a server-side bundling job.
    async fn create_export(&self, object_ids: &[String]) -> TransferResult<ExportJob>;

    async fn get_object(&self, id: &str) -> TransferResult<ObjectPayload>;

    /// Batched status query for export jobs.
    async fn export_progress(&self, ids: &[String]) -> TransferResult<Vec<ExportJob>>;

    async fn export_zip(&self, id: &str) -> TransferResult<ExportArtifact>;

    async fn remove_objects(&self, ids: &[String]) -> TransferResult<()>;
}
