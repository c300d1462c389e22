//! Error types for the transfer orchestrator

use thiserror::Error;

pub type TransferResult<T> = Result<T, TransferError>;

/// Every failure the orchestrator can observe at a collaborator boundary.
///
/// None of these escape a worker task: they are logged where they occur and
/// reflected in the store as item/job status.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Upload or commit step failed for an item.
    #[error("transfer failed for {item}: {reason}")]
    Transfer { item: String, reason: String },

    /// Batched export status query failed. Retried on the next tick.
    #[error("export status poll failed: {0}")]
    Poll(String),

    /// Encoded payload could not be turned into bytes.
    #[error("malformed payload: {0}")]
    Decode(String),

    /// Server reports the export artifact as expired.
    #[error("export {0} has expired")]
    ExpiredArtifact(String),

    /// Non-success HTTP response.
    #[error("api request failed: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TransferError {
    /// Wrap a step failure with the item it belongs to.
    pub fn transfer(item: &str, reason: impl std::fmt::Display) -> Self {
        TransferError::Transfer {
            item: item.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Skips that are expected outcomes rather than faults.
    pub fn is_expected_skip(&self) -> bool {
        matches!(self, TransferError::ExpiredArtifact(_))
    }
}
