use filetray_lib::api::{HttpObjectApi, ObjectApi, ObjectMetadata};
use filetray_lib::config::ApiConfig;
use filetray_lib::store::{ExportStatus, UploadFile};
use filetray_lib::TransferError;
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpObjectApi {
    HttpObjectApi::new(&ApiConfig {
        base_url: format!("{}/", server.uri()),
        token: Some("secret".to_string()),
    })
    .unwrap()
}

#[tokio::test]
async fn upload_sends_multipart_file_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/object/upload"))
        .and(header("authorization", "Bearer secret"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("hello world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"originalPath": "uploads/a.txt", "thumbnailPath": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uploaded = client(&server)
        .upload(&UploadFile::from_bytes("a.txt", "text/plain", b"hello world".to_vec()))
        .await
        .unwrap();
    assert_eq!(uploaded.original_path, "uploads/a.txt");
    assert!(uploaded.thumbnail_path.is_none());
}

#[tokio::test]
async fn upload_streams_files_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/object/upload"))
        .and(body_string_contains("streamed from disk"))
        .and(body_string_contains("filename=\"notes.txt\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"originalPath": "uploads/notes.txt", "thumbnailPath": "thumbs/notes.txt"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::File::create(&file_path)
        .unwrap()
        .write_all(b"streamed from disk")
        .unwrap();

    let file = UploadFile::from_path(&file_path).await.unwrap();
    assert_eq!(file.content_type, "text/plain");
    assert_eq!(file.size, 18);

    let uploaded = client(&server).upload(&file).await.unwrap();
    assert_eq!(uploaded.thumbnail_path.as_deref(), Some("thumbs/notes.txt"));
}

#[tokio::test]
async fn add_object_posts_camel_case_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/object"))
        .and(body_json(json!({
            "originalName": "cat.png",
            "sizeInByte": 42,
            "originalType": "image/png",
            "parentId": "folder-1",
            "extension": "png",
            "originalPath": "uploads/cat.png",
            "thumbnailPath": "thumbs/cat.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "obj-1", "originalName": "cat.png"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client(&server)
        .add_object(&ObjectMetadata {
            original_name: "cat.png".to_string(),
            size_in_byte: 42,
            original_type: "image/png".to_string(),
            parent_id: Some("folder-1".to_string()),
            extension: "png".to_string(),
            original_path: "uploads/cat.png".to_string(),
            thumbnail_path: Some("thumbs/cat.png".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(record.id, "obj-1");
}

#[tokio::test]
async fn create_export_and_poll_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/object/export"))
        .and(body_json(json!({"objectsIds": ["o1", "o2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "j1", "name": "Bundle", "status": "INITIATED"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/object/export-progress"))
        .and(query_param("_ids", "j1,j2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"_id": "j1", "name": "Bundle", "status": "COMPLETED"},
                {"_id": "j2", "status": "EXPIRED"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let job = api
        .create_export(&["o1".to_string(), "o2".to_string()])
        .await
        .unwrap();
    assert_eq!(job.id, "j1");
    assert_eq!(job.status, ExportStatus::Initiated);

    let jobs = api
        .export_progress(&["j1".to_string(), "j2".to_string()])
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].status, ExportStatus::Completed);
    assert_eq!(jobs[1].status, ExportStatus::Expired);
    assert_eq!(jobs[1].name, "");
}

#[tokio::test]
async fn created_export_without_status_is_initiated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/object/export"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "j1", "name": "Bundle"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = client(&server)
        .create_export(&["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    assert_eq!(job.id, "j1");
    assert_eq!(job.name, "Bundle");
    assert_eq!(job.status, ExportStatus::Initiated);
}

#[tokio::test]
async fn export_zip_and_get_object_use_id_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/object/export-zip"))
        .and(query_param("_id", "j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"status": "COMPLETED", "originalPath": "UEsDBA=="}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/object"))
        .and(query_param("_id", "o1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"originalPath": "data:text/plain;base64,aGk=", "originalName": "hi.txt"}
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let artifact = api.export_zip("j1").await.unwrap();
    assert_eq!(artifact.status, ExportStatus::Completed);
    assert_eq!(artifact.original_path.as_deref(), Some("UEsDBA=="));

    let object = api.get_object("o1").await.unwrap();
    assert_eq!(object.original_name, "hi.txt");
}

#[tokio::test]
async fn remove_objects_sends_ids_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/object"))
        .and(body_json(json!({"_ids": ["o1", "o2"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .remove_objects(&["o1".to_string(), "o2".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn error_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/object/export-progress"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server)
        .export_progress(&["j1".to_string()])
        .await
        .unwrap_err();
    match err {
        TransferError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn malformed_envelope_is_a_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/object/export-zip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"COMPLETED\"}"))
        .mount(&server)
        .await;

    let err = client(&server).export_zip("j1").await.unwrap_err();
    assert!(matches!(err, TransferError::Json(_)));
}
