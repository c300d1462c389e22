//! Transfer orchestrator - owns the store, spawns the workers and exposes the UI-facing commands

use crate::api::ObjectApi;
use crate::config::TransferConfig;
use crate::error::TransferResult;
use crate::export::{ArtifactFetcher, ExportPoller};
use crate::save::SaveBinary;
use crate::store::{
    Mutation, TransferState, TransferStore, UploadFile, UploadItem, UploadPhase, UploadStatus,
};
use crate::upload::UploadSequencer;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What a download request for the current selection turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionDownload {
    /// Nothing was selected.
    Nothing,
    /// A single object was saved directly.
    Saved(PathBuf),
    /// Several objects were handed to an export job with this id.
    Exporting(String),
}

pub struct Orchestrator {
    store: TransferStore,
    api: Arc<dyn ObjectApi>,
    fetcher: Arc<ArtifactFetcher>,
    halt_marker: watch::Receiver<Option<String>>,
    token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    /// Create the store and spawn the upload and export workers.
    pub fn start(
        api: Arc<dyn ObjectApi>,
        saver: Arc<dyn SaveBinary>,
        config: &TransferConfig,
    ) -> Self {
        let store = TransferStore::new();
        let token = CancellationToken::new();
        let fetcher = Arc::new(ArtifactFetcher::new(api.clone(), saver));

        let sequencer = UploadSequencer::new(store.clone(), api.clone(), config.failure_policy);
        let halt_marker = sequencer.halt_marker();
        let poller = ExportPoller::new(
            store.clone(),
            api.clone(),
            fetcher.clone(),
            config.poll_interval,
            config.settle_delay,
        );

        let workers = vec![
            tokio::spawn(sequencer.run(token.clone())),
            tokio::spawn(poller.run(token.clone())),
        ];
        info!(
            "orchestrator_started: poll_interval_ms={} settle_delay_ms={} policy={:?}",
            config.poll_interval.as_millis(),
            config.settle_delay.as_millis(),
            config.failure_policy
        );

        Self {
            store,
            api,
            fetcher,
            halt_marker,
            token,
            workers,
        }
    }

    pub fn store(&self) -> &TransferStore {
        &self.store
    }

    /// Queue files for upload into `parent_id`. Returns the new item ids.
    pub fn enqueue_uploads(&self, files: Vec<UploadFile>, parent_id: Option<String>) -> Vec<String> {
        let items: Vec<UploadItem> = files
            .into_iter()
            .map(|file| UploadItem::new(file, parent_id.clone()))
            .collect();
        let ids = items.iter().map(|item| item.id.clone()).collect();
        self.store.apply(Mutation::EnqueueUploads(items));
        ids
    }

    /// One object downloads directly; two or more go through an export job.
    pub async fn download_selection(&self, ids: &[String]) -> TransferResult<SelectionDownload> {
        match ids {
            [] => Ok(SelectionDownload::Nothing),
            [id] => match self.fetcher.download_object(id).await {
                Ok(path) => Ok(SelectionDownload::Saved(path)),
                Err(e) => {
                    error!("object_download_failed: {} error={}", id, e);
                    Err(e)
                }
            },
            _ => match self.api.create_export(ids).await {
                Ok(job) => {
                    info!("export_created: {} objects={} status={}", job.id, ids.len(), job.status);
                    let job_id = job.id.clone();
                    self.store.apply(Mutation::EnqueueExportJobs(vec![job]));
                    Ok(SelectionDownload::Exporting(job_id))
                }
                Err(e) => {
                    error!("export_create_failed: objects={} error={}", ids.len(), e);
                    Err(e)
                }
            },
        }
    }

    pub async fn remove_selection(&self, ids: &[String]) -> TransferResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        match self.api.remove_objects(ids).await {
            Ok(()) => {
                info!("objects_removed: count={}", ids.len());
                Ok(())
            }
            Err(e) => {
                warn!("objects_remove_failed: count={} error={}", ids.len(), e);
                Err(e)
            }
        }
    }

    /// No upload can still make progress, no export is polling and no artifact
    /// is waiting to be fetched or being saved.
    pub fn is_idle(&self, state: &TransferState) -> bool {
        let halted_after = self.halt_marker.borrow().clone();
        uploads_idle(state, halted_after.as_deref())
            && !state.has_initiated()
            && !self.fetcher.has_pending(state)
            && !self.fetcher.is_busy()
    }

    pub async fn wait_until_idle(&self) {
        let mut updates = self.store.subscribe();
        let mut activity = self.fetcher.subscribe_activity();
        let mut halts = self.halt_marker.clone();
        loop {
            let state = updates.borrow_and_update().clone();
            let _ = activity.borrow_and_update();
            let _ = halts.borrow_and_update();
            if self.is_idle(&state) {
                return;
            }
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                changed = activity.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                changed = halts.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }

    /// Stop the workers. A pass or fetch already under way finishes first.
    pub async fn shutdown(self) {
        self.token.cancel();
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("orchestrator_worker_join_failed: {}", e);
            }
        }
        info!("orchestrator_stopped");
    }
}

fn uploads_idle(state: &TransferState, halted_after: Option<&str>) -> bool {
    if state.upload_phase == UploadPhase::Processing {
        return false;
    }
    let waiting = state
        .upload_queue
        .iter()
        .any(|item| item.status == UploadStatus::InQueue);
    let running = state
        .upload_queue
        .iter()
        .any(|item| item.status == UploadStatus::InProgress);
    !running && (!waiting || crate::upload::is_halted_at_tail(state, halted_after))
}
