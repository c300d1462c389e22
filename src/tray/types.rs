//! Tray view types

use serde::Serialize;

pub const WARNING_TITLE: &str = "Uploading still in progress";
pub const WARNING_DESCRIPTION: &str = "Do you want to cancel uploading?";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusIcon {
    /// Hourglass
    Pending,
    /// Check mark
    Completed,
    Failed,
}

impl StatusIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            StatusIcon::Pending => "⌛",
            StatusIcon::Completed => "✔",
            StatusIcon::Failed => "✖",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrayRow {
    pub name: String,
    pub icon: StatusIcon,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WarningPrompt {
    pub title: &'static str,
    pub description: &'static str,
}

/// Everything needed to draw the tray for one snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrayView {
    pub visible: bool,
    pub expanded: bool,
    pub header: String,
    /// Export jobs, in insertion order
    pub downloads: Vec<TrayRow>,
    /// Upload items, in insertion order
    pub uploads: Vec<TrayRow>,
    pub warning: Option<WarningPrompt>,
}

/// What a dismiss request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    /// Work is outstanding; the confirmation prompt is shown and nothing was cleared.
    NeedsConfirmation,
    /// Both lists were cleared and the tray is hidden.
    Closed,
}
