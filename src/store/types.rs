//! Transfer state types: upload items, export jobs and the aggregate snapshot

use crate::error::TransferResult;
use crate::mime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadStatus {
    #[serde(rename = "INQUEUE")]
    InQueue,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

impl UploadStatus {
    fn rank(self) -> u8 {
        match self {
            UploadStatus::InQueue => 0,
            UploadStatus::InProgress => 1,
            UploadStatus::Completed | UploadStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }

    /// Items only move forward; terminal states are final.
    pub fn can_advance_to(self, next: UploadStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::InQueue => write!(f, "INQUEUE"),
            UploadStatus::InProgress => write!(f, "IN_PROGRESS"),
            UploadStatus::Completed => write!(f, "COMPLETED"),
            UploadStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Server-side export job status. A job starts `Initiated`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ExportStatus {
    #[default]
    Initiated,
    Completed,
    Expired,
}

impl ExportStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExportStatus::Initiated)
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportStatus::Initiated => write!(f, "INITIATED"),
            ExportStatus::Completed => write!(f, "COMPLETED"),
            ExportStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl From<String> for ExportStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "COMPLETED" => ExportStatus::Completed,
            "EXPIRED" => ExportStatus::Expired,
            // Anything unrecognised keeps the job in the polling set
            _ => ExportStatus::Initiated,
        }
    }
}

impl From<ExportStatus> for String {
    fn from(value: ExportStatus) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadPhase {
    #[default]
    Idle,
    Processing,
    Completed,
}

/// Where an upload's bytes come from.
#[derive(Debug, Clone)]
pub enum FileBody {
    Path(PathBuf),
    Memory(Arc<Vec<u8>>),
}

/// Raw payload plus the metadata committed with it.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub body: FileBody,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type: content_type.into(),
            body: FileBody::Memory(Arc::new(bytes)),
        }
    }

    /// Describe a file on disk without reading it.
    pub async fn from_path(path: &Path) -> TransferResult<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            content_type: mime::guess_from_name(&name).to_string(),
            name,
            size: metadata.len(),
            body: FileBody::Path(path.to_path_buf()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: String,
    pub file: UploadFile,
    pub status: UploadStatus,
    pub parent_id: Option<String>,
}

impl UploadItem {
    pub fn new(file: UploadFile, parent_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file,
            status: UploadStatus::InQueue,
            parent_id,
        }
    }
}

/// Export job as tracked by the tray and reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportJob {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: ExportStatus,
}

/// Immutable snapshot published by the store.
#[derive(Debug, Clone, Default)]
pub struct TransferState {
    pub upload_queue: Vec<UploadItem>,
    pub export_jobs: Vec<ExportJob>,
    pub upload_phase: UploadPhase,
}

impl TransferState {
    pub fn completed_uploads(&self) -> usize {
        self.upload_queue
            .iter()
            .filter(|item| item.status == UploadStatus::Completed)
            .count()
    }

    pub fn terminal_uploads(&self) -> usize {
        self.upload_queue
            .iter()
            .filter(|item| item.status.is_terminal())
            .count()
    }

    /// A pass is running and has not completed every item.
    pub fn upload_in_progress(&self) -> bool {
        self.upload_phase == UploadPhase::Processing
            && self.completed_uploads() != self.upload_queue.len()
    }

    pub fn initiated_ids(&self) -> Vec<String> {
        self.export_jobs
            .iter()
            .filter(|job| job.status == ExportStatus::Initiated)
            .map(|job| job.id.clone())
            .collect()
    }

    /// Export polling is active iff this holds.
    pub fn has_initiated(&self) -> bool {
        self.export_jobs
            .iter()
            .any(|job| job.status == ExportStatus::Initiated)
    }

    pub fn completed_exports(&self) -> impl Iterator<Item = &ExportJob> {
        self.export_jobs
            .iter()
            .filter(|job| job.status == ExportStatus::Completed)
    }

    pub fn upload(&self, id: &str) -> Option<&UploadItem> {
        self.upload_queue.iter().find(|item| item.id == id)
    }

    pub fn export(&self, id: &str) -> Option<&ExportJob> {
        self.export_jobs.iter().find(|job| job.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_status_only_moves_forward() {
        use UploadStatus::*;
        assert!(InQueue.can_advance_to(InProgress));
        assert!(InQueue.can_advance_to(Failed));
        assert!(InProgress.can_advance_to(Completed));
        assert!(!InProgress.can_advance_to(InQueue));
        assert!(!Completed.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(Completed));
    }

    #[test]
    fn export_status_parses_server_strings() {
        assert_eq!(ExportStatus::from("COMPLETED".to_string()), ExportStatus::Completed);
        assert_eq!(ExportStatus::from("expired".to_string()), ExportStatus::Expired);
        assert_eq!(ExportStatus::from("QUEUED".to_string()), ExportStatus::Initiated);
    }

    #[test]
    fn export_job_uses_underscore_id_on_the_wire() {
        let job: ExportJob =
            serde_json::from_str(r#"{"_id":"j1","name":"Bundle","status":"INITIATED"}"#).unwrap();
        assert_eq!(job.id, "j1");
        assert_eq!(job.status, ExportStatus::Initiated);

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["_id"], "j1");
        assert_eq!(json["status"], "INITIATED");
    }

    #[test]
    fn export_job_without_status_starts_initiated() {
        let job: ExportJob = serde_json::from_str(r#"{"_id":"j7"}"#).unwrap();
        assert_eq!(job.status, ExportStatus::Initiated);
        assert_eq!(job.name, "");
    }

    #[test]
    fn new_upload_items_are_queued_with_unique_ids() {
        let file = UploadFile::from_bytes("a.txt", "text/plain", vec![1, 2]);
        let first = UploadItem::new(file.clone(), Some("folder-1".to_string()));
        let second = UploadItem::new(file, None);
        assert_eq!(first.status, UploadStatus::InQueue);
        assert_eq!(first.parent_id.as_deref(), Some("folder-1"));
        assert_eq!(first.file.size, 2);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn upload_in_progress_requires_processing_phase() {
        let mut state = TransferState::default();
        state
            .upload_queue
            .push(UploadItem::new(UploadFile::from_bytes("a.txt", "text/plain", vec![1]), None));
        assert!(!state.upload_in_progress());

        state.upload_phase = UploadPhase::Processing;
        assert!(state.upload_in_progress());

        state.upload_queue[0].status = UploadStatus::Completed;
        assert!(!state.upload_in_progress());
    }
}
