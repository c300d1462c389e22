//! Upload sequencer - drains the queue one item at a time: upload, then commit

use crate::api::{ObjectApi, ObjectMetadata, ObjectRecord, UploadedFile};
use crate::config::UploadFailurePolicy;
use crate::error::{TransferError, TransferResult};
use crate::mime::format_mimetype;
use crate::store::{Mutation, TransferState, TransferStore, UploadItem, UploadPhase, UploadStatus};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub struct UploadSequencer {
    store: TransferStore,
    api: Arc<dyn ObjectApi>,
    policy: UploadFailurePolicy,
    // Last queued item id when a `Halt` pass stopped; only newer items re-arm
    halted_after: watch::Sender<Option<String>>,
}

/// Metadata committed for an item once its bytes are stored.
pub(crate) fn commit_metadata(item: &UploadItem, uploaded: UploadedFile) -> ObjectMetadata {
    ObjectMetadata {
        original_name: item.file.name.clone(),
        size_in_byte: item.file.size,
        original_type: item.file.content_type.clone(),
        parent_id: item.parent_id.clone(),
        extension: format_mimetype(&item.file.content_type),
        original_path: uploaded.original_path,
        thumbnail_path: uploaded.thumbnail_path,
    }
}

/// Nothing was enqueued since a halted pass stopped at `halted_after`.
pub(crate) fn is_halted_at_tail(state: &TransferState, halted_after: Option<&str>) -> bool {
    match (halted_after, state.upload_queue.last()) {
        (Some(halted_id), Some(last)) => halted_id == last.id,
        _ => false,
    }
}

impl UploadSequencer {
    pub fn new(store: TransferStore, api: Arc<dyn ObjectApi>, policy: UploadFailurePolicy) -> Self {
        let (halted_after, _) = watch::channel(None);
        Self {
            store,
            api,
            policy,
            halted_after,
        }
    }

    /// Id of the queue tail when the last pass halted, if it did.
    pub fn halt_marker(&self) -> watch::Receiver<Option<String>> {
        self.halted_after.subscribe()
    }

    /// There is unfinished work and no pass is running.
    pub fn should_activate(&self, state: &TransferState) -> bool {
        let total = state.upload_queue.len();
        if total == 0
            || state.terminal_uploads() == total
            || state.upload_phase == UploadPhase::Processing
        {
            return false;
        }
        !is_halted_at_tail(state, self.halted_after.borrow().as_deref())
    }

    /// Run one full pass over the queue in insertion order.
    ///
    /// Items enqueued while the pass runs are picked up by the same pass.
    pub async fn run_pass(&mut self) {
        self.store.apply(Mutation::SetUploadPhase(UploadPhase::Processing));
        self.halted_after.send_replace(None);

        let (mut completed, mut failed, mut halted) = (0, 0, false);
        let mut index = 0;
        loop {
            let item = match self.store.snapshot().upload_queue.get(index) {
                Some(item) => item.clone(),
                None => break,
            };
            index += 1;
            if item.status != UploadStatus::InQueue {
                continue;
            }

            match self.process_item(&item).await {
                Ok(_) => completed += 1,
                Err(_) => {
                    failed += 1;
                    if self.policy == UploadFailurePolicy::Halt {
                        let tail = self
                            .store
                            .snapshot()
                            .upload_queue
                            .last()
                            .map(|last| last.id.clone());
                        self.halted_after.send_replace(tail);
                        halted = true;
                        break;
                    }
                }
            }
        }

        self.store.apply(Mutation::SetUploadPhase(UploadPhase::Completed));
        info!(
            "upload_pass_done: completed={} failed={} halted={}",
            completed, failed, halted
        );
    }

    async fn process_item(&self, item: &UploadItem) -> TransferResult<ObjectRecord> {
        self.set_status(&item.id, UploadStatus::InProgress);
        info!(
            "upload_start: {} name={} size={}",
            item.id, item.file.name, item.file.size
        );

        let result = self.upload_and_commit(item).await;
        match &result {
            Ok(record) => {
                info!("upload_done: {} object={}", item.id, record.id);
                self.set_status(&item.id, UploadStatus::Completed);
            }
            Err(e) => {
                warn!("upload_failed: {} error={}", item.id, e);
                self.set_status(&item.id, UploadStatus::Failed);
            }
        }
        result
    }

    async fn upload_and_commit(&self, item: &UploadItem) -> TransferResult<ObjectRecord> {
        let uploaded = self
            .api
            .upload(&item.file)
            .await
            .map_err(|e| TransferError::transfer(&item.id, format!("upload step: {}", e)))?;

        let metadata = commit_metadata(item, uploaded);
        self.api
            .add_object(&metadata)
            .await
            .map_err(|e| TransferError::transfer(&item.id, format!("commit step: {}", e)))
    }

    fn set_status(&self, id: &str, status: UploadStatus) {
        self.store.apply(Mutation::UpdateUploadStatus {
            id: id.to_string(),
            status,
        });
    }

    /// Worker loop: re-evaluate activation on every store change.
    ///
    /// A running pass is never interrupted; cancellation is checked between passes.
    pub async fn run(mut self, token: CancellationToken) {
        let mut updates = self.store.subscribe();
        loop {
            let state = updates.borrow_and_update().clone();
            if self.should_activate(&state) {
                self.run_pass().await;
                if token.is_cancelled() {
                    break;
                }
                continue;
            }

            tokio::select! {
                _ = token.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("upload_worker_stopped");
    }
}
