//! Request and response payloads of the object service

use crate::store::ExportStatus;
use serde::{Deserialize, Serialize};

/// Every response body is wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Paths returned by the raw upload step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub original_path: String,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

/// Descriptive metadata committed after the bytes are stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub original_name: String,
    pub size_in_byte: u64,
    pub original_type: String,
    pub parent_id: Option<String>,
    pub extension: String,
    pub original_path: String,
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub original_name: String,
}

/// A single object's encoded content, used for direct downloads.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPayload {
    pub original_path: String,
    pub original_name: String,
}

/// Encoded export bundle.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub status: ExportStatus,
    #[serde(default)]
    pub original_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExportRequest<'a> {
    pub objects_ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct RemoveRequest<'a> {
    #[serde(rename = "_ids")]
    pub ids: &'a [String],
}
