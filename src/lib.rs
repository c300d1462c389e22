//! Transfer orchestration for a file-management client.
//!
//! - `store`: single-writer transfer state (upload queue, export jobs)
//! - `upload`: sequential upload + commit worker
//! - `export`: export status poller, artifact fetcher and payload decoder
//! - `tray`: status tray projection and guarded dismiss
//! - `orchestrator`: wires the above and exposes the selection commands
//! - `api`: object service collaborators and their HTTP implementation

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod mime;
pub mod orchestrator;
pub mod save;
pub mod store;
pub mod tray;
pub mod upload;

pub use config::{build_config, Config, ConfigInput, TransferConfig, UploadFailurePolicy};
pub use error::{TransferError, TransferResult};
pub use orchestrator::{Orchestrator, SelectionDownload};
