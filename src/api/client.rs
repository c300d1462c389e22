//! HTTP client for the object service

use crate::config::ApiConfig;
use crate::error::{TransferError, TransferResult};
use crate::store::{ExportJob, FileBody, UploadFile};
use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::types::{
    DataEnvelope, ExportArtifact, ExportRequest, ObjectMetadata, ObjectPayload, ObjectRecord,
    RemoveRequest, UploadedFile,
};
use super::ObjectApi;

const OBJECT: &str = "object";

pub struct HttpObjectApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpObjectApi {
    pub fn new(config: &ApiConfig) -> TransferResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn json_body<T: Serialize>(request: RequestBuilder, payload: &T) -> TransferResult<RequestBuilder> {
        Ok(request
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(payload)?))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> TransferResult<T> {
        let response = self.authorize(request).send().await?;
        read_data(response).await
    }
}

/// Unwrap `{ data }` from a successful response; anything else is an `Api` error.
async fn read_data<T: DeserializeOwned>(response: Response) -> TransferResult<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(TransferError::Api {
            status: status.as_u16(),
            body: text,
        });
    }
    let envelope: DataEnvelope<T> = serde_json::from_str(&text)?;
    Ok(envelope.data)
}

async fn file_part(file: &UploadFile) -> TransferResult<Part> {
    let part = match &file.body {
        FileBody::Memory(bytes) => Part::bytes(bytes.to_vec()),
        FileBody::Path(path) => {
            let handle = File::open(path).await?;
            let body = Body::wrap_stream(ReaderStream::new(handle));
            Part::stream_with_length(body, file.size)
        }
    };
    Ok(part.file_name(file.name.clone()).mime_str(&file.content_type)?)
}

#[async_trait]
impl ObjectApi for HttpObjectApi {
    async fn upload(&self, file: &UploadFile) -> TransferResult<UploadedFile> {
        debug!("api_upload: name={} size={}", file.name, file.size);
        let form = Form::new().part("file", file_part(file).await?);
        let request = self
            .client
            .post(self.url(&format!("{}/upload", OBJECT)))
            .multipart(form);
        self.send(request).await
    }

    async fn add_object(&self, metadata: &ObjectMetadata) -> TransferResult<ObjectRecord> {
        let request = Self::json_body(self.client.post(self.url(OBJECT)), metadata)?;
        self.send(request).await
    }

    async fn create_export(&self, object_ids: &[String]) -> TransferResult<ExportJob> {
        let payload = ExportRequest { objects_ids: object_ids };
        let request = Self::json_body(
            self.client.post(self.url(&format!("{}/export", OBJECT))),
            &payload,
        )?;
        self.send(request).await
    }

    async fn get_object(&self, id: &str) -> TransferResult<ObjectPayload> {
        let url = format!("{}?_id={}", self.url(OBJECT), urlencoding::encode(id));
        self.send(self.client.get(url)).await
    }

    async fn export_progress(&self, ids: &[String]) -> TransferResult<Vec<ExportJob>> {
        let url = format!(
            "{}?_ids={}",
            self.url(&format!("{}/export-progress", OBJECT)),
            urlencoding::encode(&ids.join(","))
        );
        self.send(self.client.get(url)).await
    }

    async fn export_zip(&self, id: &str) -> TransferResult<ExportArtifact> {
        let url = format!(
            "{}?_id={}",
            self.url(&format!("{}/export-zip", OBJECT)),
            urlencoding::encode(id)
        );
        self.send(self.client.get(url)).await
    }

    async fn remove_objects(&self, ids: &[String]) -> TransferResult<()> {
        let request = Self::json_body(self.client.delete(self.url(OBJECT)), &RemoveRequest { ids })?;
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransferError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
