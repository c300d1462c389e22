//! Tray presenter - projects the transfer store and owns the close/expand affordances

use crate::store::{ExportStatus, Mutation, TransferState, TransferStore, UploadStatus};
use log::info;

use super::types::{
    DismissOutcome, StatusIcon, TrayRow, TrayView, WarningPrompt, WARNING_DESCRIPTION,
    WARNING_TITLE,
};

pub struct TrayPresenter {
    store: TransferStore,
    min_width: u32,
    viewport_width: u32,
    expanded: bool,
    closed: bool,
    warning_open: bool,
}

/// `"2 Uploaded & 1 Downloaded"`; segments with a zero count are omitted.
pub fn header_text(state: &TransferState) -> String {
    let uploaded = state.completed_uploads();
    let downloaded = state.completed_exports().count();
    let mut header = String::new();
    if uploaded > 0 {
        header.push_str(&format!("{} Uploaded", uploaded));
    }
    if uploaded > 0 && downloaded > 0 {
        header.push_str(" & ");
    }
    if downloaded > 0 {
        header.push_str(&format!("{} Downloaded", downloaded));
    }
    header
}

fn upload_icon(status: UploadStatus) -> StatusIcon {
    match status {
        UploadStatus::Completed => StatusIcon::Completed,
        UploadStatus::Failed => StatusIcon::Failed,
        UploadStatus::InQueue | UploadStatus::InProgress => StatusIcon::Pending,
    }
}

fn export_icon(status: ExportStatus) -> StatusIcon {
    match status {
        ExportStatus::Completed => StatusIcon::Completed,
        ExportStatus::Expired => StatusIcon::Failed,
        ExportStatus::Initiated => StatusIcon::Pending,
    }
}

/// Work the dismiss guard protects: an unfinished upload pass or active export polling.
pub fn has_outstanding_work(state: &TransferState) -> bool {
    state.upload_in_progress() || state.has_initiated()
}

impl TrayPresenter {
    pub fn new(store: TransferStore, min_width: u32) -> Self {
        Self {
            store,
            min_width,
            viewport_width: u32::MAX,
            expanded: true,
            closed: true,
            warning_open: false,
        }
    }

    /// Feed a new snapshot. Opens the tray when work starts.
    pub fn observe(&mut self, state: &TransferState) {
        let uploads_pending = state
            .upload_queue
            .iter()
            .any(|item| !item.status.is_terminal());
        if self.closed && (uploads_pending || state.has_initiated()) {
            self.closed = false;
        }
    }

    pub fn set_viewport_width(&mut self, width: u32) {
        self.viewport_width = width;
    }

    pub fn toggle_expand(&mut self) {
        self.expanded = !self.expanded;
    }

    /// Close the tray, unless work is outstanding, in which case ask first.
    pub fn dismiss(&mut self) -> DismissOutcome {
        let state = self.store.snapshot();
        if has_outstanding_work(&state) {
            self.warning_open = true;
            info!(
                "tray_dismiss_blocked: uploads={}/{} exports_polling={}",
                state.completed_uploads(),
                state.upload_queue.len(),
                state.has_initiated()
            );
            return DismissOutcome::NeedsConfirmation;
        }

        self.closed = true;
        self.store.apply(Mutation::ClearUploads);
        self.store.apply(Mutation::ClearExports);
        info!("tray_dismissed");
        DismissOutcome::Closed
    }

    /// Confirming only closes the prompt; outstanding work keeps running.
    pub fn confirm_warning(&mut self) {
        self.warning_open = false;
    }

    pub fn cancel_warning(&mut self) {
        self.warning_open = false;
    }

    pub fn is_visible(&self) -> bool {
        !self.closed && self.viewport_width >= self.min_width
    }

    pub fn view(&self, state: &TransferState) -> TrayView {
        TrayView {
            visible: self.is_visible(),
            expanded: self.expanded,
            header: header_text(state),
            downloads: state
                .export_jobs
                .iter()
                .map(|job| TrayRow {
                    name: job.name.clone(),
                    icon: export_icon(job.status),
                })
                .collect(),
            uploads: state
                .upload_queue
                .iter()
                .map(|item| TrayRow {
                    name: item.file.name.clone(),
                    icon: upload_icon(item.status),
                })
                .collect(),
            warning: self.warning_open.then_some(WarningPrompt {
                title: WARNING_TITLE,
                description: WARNING_DESCRIPTION,
            }),
        }
    }
}
