//! Single-writer transfer store
//!
//! Consumers never touch [`TransferState`] directly: they read snapshots and
//! submit [`Mutation`]s. Every mutation is applied atomically and published to
//! subscribers through a watch channel; no-ops do not wake anyone.

use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

use super::types::{ExportJob, TransferState, UploadItem, UploadPhase, UploadStatus};

/// The complete set of state transitions.
#[derive(Debug, Clone)]
pub enum Mutation {
    EnqueueUploads(Vec<UploadItem>),
    SetUploadPhase(UploadPhase),
    UpdateUploadStatus { id: String, status: UploadStatus },
    EnqueueExportJobs(Vec<ExportJob>),
    UpdateExportJob(ExportJob),
    ClearUploads,
    ClearExports,
}

#[derive(Clone)]
pub struct TransferStore {
    sender: Arc<watch::Sender<Arc<TransferState>>>,
}

impl Default for TransferStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferStore {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(Arc::new(TransferState::default()));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn snapshot(&self) -> Arc<TransferState> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TransferState>> {
        self.sender.subscribe()
    }

    /// Apply a mutation. Total: unknown ids and illegal transitions are ignored.
    pub fn apply(&self, mutation: Mutation) {
        self.sender
            .send_if_modified(|state| reduce(Arc::make_mut(state), mutation));
    }
}

fn reduce(state: &mut TransferState, mutation: Mutation) -> bool {
    match mutation {
        Mutation::EnqueueUploads(items) => {
            if items.is_empty() {
                return false;
            }
            debug!("store_enqueue_uploads: count={}", items.len());
            state.upload_queue.extend(items);
            true
        }
        Mutation::SetUploadPhase(phase) => {
            if state.upload_phase == phase {
                return false;
            }
            debug!("store_upload_phase: {:?} -> {:?}", state.upload_phase, phase);
            state.upload_phase = phase;
            true
        }
        Mutation::UpdateUploadStatus { id, status } => {
            match state.upload_queue.iter_mut().find(|item| item.id == id) {
                Some(item) if item.status.can_advance_to(status) => {
                    debug!("store_upload_status: {} {} -> {}", id, item.status, status);
                    item.status = status;
                    true
                }
                _ => false,
            }
        }
        Mutation::EnqueueExportJobs(jobs) => {
            let mut changed = false;
            for job in jobs {
                if state.export_jobs.iter().any(|existing| existing.id == job.id) {
                    continue;
                }
                debug!("store_enqueue_export: {} status={}", job.id, job.status);
                state.export_jobs.push(job);
                changed = true;
            }
            changed
        }
        Mutation::UpdateExportJob(update) => {
            match state.export_jobs.iter_mut().find(|job| job.id == update.id) {
                Some(job) if !job.status.is_terminal() => {
                    let renamed = !update.name.is_empty() && update.name != job.name;
                    if job.status == update.status && !renamed {
                        return false;
                    }
                    debug!("store_export_status: {} {} -> {}", job.id, job.status, update.status);
                    job.status = update.status;
                    if renamed {
                        job.name = update.name;
                    }
                    true
                }
                _ => false,
            }
        }
        Mutation::ClearUploads => {
            let changed = !state.upload_queue.is_empty() || state.upload_phase != UploadPhase::Idle;
            state.upload_queue.clear();
            state.upload_phase = UploadPhase::Idle;
            changed
        }
        Mutation::ClearExports => {
            let changed = !state.export_jobs.is_empty();
            state.export_jobs.clear();
            changed
        }
    }
}
