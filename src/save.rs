//! Host save capability: how a decoded artifact reaches the user's device

use crate::error::TransferResult;
use crate::export::Artifact;
use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait SaveBinary: Send + Sync {
    /// Present `artifact` to the user under `file_name`. Returns where it landed.
    async fn save(&self, artifact: &Artifact, file_name: &str) -> TransferResult<PathBuf>;
}

/// Saves into a download directory without ever overwriting an existing file.
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Strip anything that would escape the download directory.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    match base {
        "" | "." | ".." => "download".to_string(),
        other => other.to_string(),
    }
}

/// `name.ext`, `name (1).ext`, `name (2).ext`, ...
fn candidate(dir: &Path, name: &str, attempt: u32) -> PathBuf {
    if attempt == 0 {
        return dir.join(name);
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => dir.join(format!("{} ({}).{}", stem, attempt, ext)),
        _ => dir.join(format!("{} ({})", name, attempt)),
    }
}

#[async_trait]
impl SaveBinary for DirectorySaver {
    async fn save(&self, artifact: &Artifact, file_name: &str) -> TransferResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = sanitize_file_name(file_name);

        let mut attempt = 0;
        let (path, mut file) = loop {
            let path = candidate(&self.dir, &name, attempt);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        };

        file.write_all(&artifact.bytes).await?;
        file.flush().await?;
        info!(
            "artifact_saved: {} size={} mime={}",
            path.display(),
            artifact.bytes.len(),
            artifact.mime_type
        );
        Ok(path)
    }
}
