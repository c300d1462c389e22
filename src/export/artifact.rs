//! Artifact fetcher - turns completed export jobs (and single objects) into saved files

use crate::api::ObjectApi;
use crate::error::{TransferError, TransferResult};
use crate::mime::{OCTET_STREAM, ZIP};
use crate::save::SaveBinary;
use crate::store::{ExportJob, ExportStatus, TransferState};
use log::{error, info};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::decode::decode_payload;

const DEFAULT_EXPORT_NAME: &str = "files.zip";

/// Result of one fetch pass.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub saved: Vec<PathBuf>,
    pub expired: usize,
    pub failed: usize,
}

pub struct ArtifactFetcher {
    api: Arc<dyn ObjectApi>,
    saver: Arc<dyn SaveBinary>,
    // Job ids already handed out for fetching; never fetched twice
    claimed: Mutex<HashSet<String>>,
    // Fetches currently running (export passes and direct downloads)
    active: watch::Sender<usize>,
}

/// Download name for an export bundle.
pub(crate) fn export_file_name(job: &ExportJob) -> String {
    let name = job.name.trim();
    if name.is_empty() {
        DEFAULT_EXPORT_NAME.to_string()
    } else if name.to_ascii_lowercase().ends_with(".zip") {
        name.to_string()
    } else {
        format!("{}.zip", name)
    }
}

impl ArtifactFetcher {
    pub fn new(api: Arc<dyn ObjectApi>, saver: Arc<dyn SaveBinary>) -> Self {
        let (active, _) = watch::channel(0);
        Self {
            api,
            saver,
            claimed: Mutex::new(HashSet::new()),
            active,
        }
    }

    fn claimed_ids(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked
        self.claimed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A completed job exists that has not been fetched yet.
    pub fn has_pending(&self, state: &TransferState) -> bool {
        let claimed = self.claimed_ids();
        state.completed_exports().any(|job| !claimed.contains(&job.id))
    }

    /// Drop claims for jobs no longer in the store (cleared on dismiss).
    fn forget_missing(&self, state: &TransferState) {
        self.claimed_ids().retain(|id| state.export(id).is_some());
    }

    /// Reserve a job for fetching. False if it was already reserved.
    fn claim(&self, id: &str) -> bool {
        self.claimed_ids().insert(id.to_string())
    }

    pub fn is_busy(&self) -> bool {
        *self.active.borrow() > 0
    }

    pub fn subscribe_activity(&self) -> watch::Receiver<usize> {
        self.active.subscribe()
    }

    fn begin(&self) {
        self.active.send_modify(|n| *n += 1);
    }

    fn end(&self) {
        self.active.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Fetch and save every completed, unclaimed job in `state`, one at a time.
    pub async fn fetch_completed(&self, state: &TransferState) -> FetchReport {
        // Busy before claiming, so a claimed job is never both unclaimed and idle
        self.begin();
        self.forget_missing(state);
        let jobs: Vec<ExportJob> = state
            .completed_exports()
            .filter(|job| self.claim(&job.id))
            .cloned()
            .collect();

        let mut report = FetchReport::default();
        for job in jobs {
            match self.fetch_one(&job).await {
                Ok(path) => report.saved.push(path),
                Err(e) if e.is_expected_skip() => {
                    info!("export_artifact_expired: {}", job.id);
                    report.expired += 1;
                }
                Err(e) => {
                    error!("export_artifact_failed: {} error={}", job.id, e);
                    report.failed += 1;
                }
            }
        }
        self.end();
        report
    }

    async fn fetch_one(&self, job: &ExportJob) -> TransferResult<PathBuf> {
        let artifact = self.api.export_zip(&job.id).await?;
        if artifact.status == ExportStatus::Expired {
            return Err(TransferError::ExpiredArtifact(job.id.clone()));
        }
        let payload = artifact
            .original_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TransferError::Decode(format!("export {} has no payload", job.id)))?;

        let decoded = decode_payload(&payload, ZIP)?;
        let path = self.saver.save(&decoded, &export_file_name(job)).await?;
        info!("export_artifact_saved: {} path={}", job.id, path.display());
        Ok(path)
    }

    /// Direct download of a single object, bypassing the export queue.
    pub async fn download_object(&self, id: &str) -> TransferResult<PathBuf> {
        self.begin();
        let result = self.download_object_inner(id).await;
        self.end();
        result
    }

    async fn download_object_inner(&self, id: &str) -> TransferResult<PathBuf> {
        let object = self.api.get_object(id).await?;
        let decoded = decode_payload(&object.original_path, OCTET_STREAM)?;
        let path = self.saver.save(&decoded, &object.original_name).await?;
        info!("object_download_saved: {} path={}", id, path.display());
        Ok(path)
    }
}
