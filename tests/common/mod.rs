#![allow(dead_code)]

use async_trait::async_trait;
use filetray_lib::api::{
    ExportArtifact, ObjectApi, ObjectMetadata, ObjectPayload, ObjectRecord, UploadedFile,
};
use filetray_lib::export::Artifact;
use filetray_lib::save::SaveBinary;
use filetray_lib::store::{ExportJob, ExportStatus, UploadFile};
use filetray_lib::{TransferConfig, TransferError, TransferResult, UploadFailurePolicy};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Scriptable in-memory object service.
#[derive(Default)]
pub struct FakeApi {
    /// Every call in order, e.g. `upload:a.txt`, `export_progress:j1,j2`
    pub calls: Mutex<Vec<(Instant, String)>>,
    pub fail_upload: Mutex<HashSet<String>>,
    pub fail_commit: Mutex<HashSet<String>>,
    /// Per job: statuses returned by successive polls; the last one repeats
    pub progress: Mutex<HashMap<String, VecDeque<ExportStatus>>>,
    pub fail_next_polls: Mutex<usize>,
    pub exports: Mutex<VecDeque<ExportJob>>,
    pub artifacts: Mutex<HashMap<String, ExportArtifact>>,
    pub objects: Mutex<HashMap<String, ObjectPayload>>,
    /// When set, each upload waits for one permit
    pub upload_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<(Instant, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn script_export(&self, id: &str, name: &str, created: ExportStatus, polls: &[ExportStatus]) {
        self.exports.lock().unwrap().push_back(ExportJob {
            id: id.to_string(),
            name: name.to_string(),
            status: created,
        });
        self.progress
            .lock()
            .unwrap()
            .insert(id.to_string(), polls.iter().copied().collect());
    }

    pub fn set_artifact(&self, id: &str, status: ExportStatus, payload: Option<&str>) {
        self.artifacts.lock().unwrap().insert(
            id.to_string(),
            ExportArtifact {
                status,
                original_path: payload.map(str::to_string),
            },
        );
    }
}

#[async_trait]
impl ObjectApi for FakeApi {
    async fn upload(&self, file: &UploadFile) -> TransferResult<UploadedFile> {
        self.record(format!("upload:{}", file.name));
        let gate = self.upload_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_upload.lock().unwrap().contains(&file.name) {
            return Err(TransferError::Api {
                status: 500,
                body: "disk full".to_string(),
            });
        }
        Ok(UploadedFile {
            original_path: format!("uploads/{}", file.name),
            thumbnail_path: Some(format!("thumbs/{}", file.name)),
        })
    }

    async fn add_object(&self, metadata: &ObjectMetadata) -> TransferResult<ObjectRecord> {
        self.record(format!("add_object:{}", metadata.original_name));
        if self.fail_commit.lock().unwrap().contains(&metadata.original_name) {
            return Err(TransferError::Api {
                status: 422,
                body: "bad metadata".to_string(),
            });
        }
        Ok(ObjectRecord {
            id: format!("obj-{}", metadata.original_name),
            original_name: metadata.original_name.clone(),
        })
    }

    async fn create_export(&self, object_ids: &[String]) -> TransferResult<ExportJob> {
        self.record(format!("create_export:{}", object_ids.join(",")));
        self.exports
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransferError::Api {
                status: 500,
                body: "no export scripted".to_string(),
            })
    }

    async fn get_object(&self, id: &str) -> TransferResult<ObjectPayload> {
        self.record(format!("get_object:{}", id));
        self.objects
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| TransferError::Api {
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn export_progress(&self, ids: &[String]) -> TransferResult<Vec<ExportJob>> {
        self.record(format!("export_progress:{}", ids.join(",")));
        {
            let mut failing = self.fail_next_polls.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(TransferError::Api {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
        }
        let mut progress = self.progress.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| {
                let script = progress.entry(id.clone()).or_default();
                let status = if script.len() > 1 {
                    script.pop_front().unwrap_or(ExportStatus::Initiated)
                } else {
                    script.front().copied().unwrap_or(ExportStatus::Initiated)
                };
                ExportJob {
                    id: id.clone(),
                    name: String::new(),
                    status,
                }
            })
            .collect())
    }

    async fn export_zip(&self, id: &str) -> TransferResult<ExportArtifact> {
        self.record(format!("export_zip:{}", id));
        self.artifacts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| TransferError::Api {
                status: 404,
                body: "no artifact".to_string(),
            })
    }

    async fn remove_objects(&self, ids: &[String]) -> TransferResult<()> {
        self.record(format!("remove_objects:{}", ids.join(",")));
        Ok(())
    }
}

/// Collects saved artifacts instead of writing files.
#[derive(Default)]
pub struct MemorySaver {
    pub saved: Mutex<Vec<(String, Artifact)>>,
}

impl MemorySaver {
    pub fn names(&self) -> Vec<String> {
        self.saved.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

#[async_trait]
impl SaveBinary for MemorySaver {
    async fn save(&self, artifact: &Artifact, file_name: &str) -> TransferResult<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((file_name.to_string(), artifact.clone()));
        Ok(PathBuf::from(file_name))
    }
}

pub fn config(policy: UploadFailurePolicy) -> TransferConfig {
    TransferConfig {
        poll_interval: Duration::from_millis(3000),
        settle_delay: Duration::from_millis(1000),
        failure_policy: policy,
        ..TransferConfig::default()
    }
}

pub fn text_file(name: &str) -> UploadFile {
    UploadFile::from_bytes(name, "text/plain", format!("contents of {}", name).into_bytes())
}

pub const ZIP_PAYLOAD: &str = "UEsDBA==";
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgo=";
