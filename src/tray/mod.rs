//! Status tray: a pure view over the transfer store plus the guarded dismiss

mod presenter;
mod types;

pub use presenter::{has_outstanding_work, header_text, TrayPresenter};
pub use types::{DismissOutcome, StatusIcon, TrayRow, TrayView, WarningPrompt};
