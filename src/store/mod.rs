//! Transfer store: the upload queue, export jobs and the coarse upload phase

mod state;
mod types;

pub use state::{Mutation, TransferStore};
pub use types::{
    ExportJob, ExportStatus, FileBody, TransferState, UploadFile, UploadItem, UploadPhase,
    UploadStatus,
};
