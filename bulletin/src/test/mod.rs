//! End-to-end tests of the HTTP surface, backed by in-memory collaborators.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::test_utils::{InMemoryConfigurationStore, StubFetcher, create_test_app, create_test_config, empty_xlsx_workbook, xlsx_workbook};
use crate::uploads::{
    CellValue,
    signing::{SIGNATURE_HEADER, TIMESTAMP_HEADER, sign_payload},
};

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const SECRET: &str = "callback-secret";

fn grades_workbook() -> Vec<u8> {
    xlsx_workbook(&[(
        "Notes",
        vec![
            vec![CellValue::String("Élève".into()), CellValue::String("Moyenne".into())],
            vec![CellValue::String("Alice".into()), CellValue::Float(15.5)],
            vec![CellValue::String("Bruno".into()), CellValue::Float(12.0)],
        ],
    )])
}

fn completion_event(name: &str, content_type: &str, config_id: Option<&str>) -> Value {
    json!({
        "metadata": { "input": { "configId": config_id } },
        "file": {
            "url": format!("https://files.example.com/f/{name}"),
            "name": name,
            "type": content_type,
            "size": 2048
        }
    })
}

fn setup(fetcher: StubFetcher) -> (axum_test::TestServer, Arc<StubFetcher>, Arc<InMemoryConfigurationStore>) {
    let fetcher = Arc::new(fetcher);
    let store = Arc::new(InMemoryConfigurationStore::default());
    let server = create_test_app(create_test_config(), fetcher.clone(), store.clone());
    (server, fetcher, store)
}

#[tokio::test]
async fn test_healthz() {
    let (server, _, _) = setup(StubFetcher::failing());

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (server, _, _) = setup(StubFetcher::failing());

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let doc: Value = response.json();
    assert!(doc["paths"]["/uploads/complete"]["post"].is_object());
}

#[test_log::test(tokio::test)]
async fn test_complete_upload_creates_configuration() {
    let (server, fetcher, store) = setup(StubFetcher::bytes(grades_workbook()));

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("notes.xlsx", XLSX, None))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["kind"], "spreadsheet");
    assert_eq!(body["rows"], 3);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(body["configId"], records[0].id.to_string());
    assert_eq!(records[0].excel_url, "https://files.example.com/f/notes.xlsx");
    assert_eq!(records[0].file_name, "notes.xlsx");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_complete_upload_updates_existing_configuration() {
    let (server, _, store) = setup(StubFetcher::bytes(grades_workbook()));
    let existing = store.insert("https://files.example.com/f/old.xlsx", "old.xlsx");

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("new.xlsx", XLSX, Some(&existing.id.to_string())))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["configId"], existing.id.to_string());

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].file_name, "new.xlsx");
    assert_eq!(records[0].excel_url, "https://files.example.com/f/new.xlsx");
    assert_eq!(store.creates(), 0);
    assert_eq!(store.updates(), 1);
}

#[tokio::test]
async fn test_complete_upload_with_unknown_configuration_is_not_found() {
    let (server, _, store) = setup(StubFetcher::bytes(grades_workbook()));
    let unknown = uuid::Uuid::new_v4();

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("notes.xlsx", XLSX, Some(&unknown.to_string())))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().contains(&unknown.to_string()));
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_complete_upload_rejects_invalid_config_id() {
    let (server, fetcher, store) = setup(StubFetcher::bytes(grades_workbook()));

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("notes.xlsx", XLSX, Some("not-a-uuid")))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.text(), "Invalid configId 'not-a-uuid'");
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_complete_upload_rejects_malformed_event() {
    let (server, fetcher, _) = setup(StubFetcher::bytes(grades_workbook()));

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&json!({ "file": { "name": "notes.xlsx" } }))
        .await;

    response.assert_status_bad_request();
    assert!(response.text().starts_with("Invalid upload event"));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_complete_upload_rejects_unsupported_content_type() {
    let (server, fetcher, store) = setup(StubFetcher::bytes(b"%PDF-1.7".to_vec()));

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("notes.pdf", "application/pdf", None))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.text(), "Unsupported content type 'application/pdf'");
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_complete_upload_rejects_oversize_file() {
    let fetcher = Arc::new(StubFetcher::bytes(grades_workbook()));
    let store = Arc::new(InMemoryConfigurationStore::default());
    let mut config = create_test_config();
    for file_type in config.uploads.file_types.values_mut() {
        file_type.max_file_size = "1KB".parse().unwrap();
    }
    let server = create_test_app(config, fetcher.clone(), store.clone());

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("notes.xlsx", XLSX, None))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(fetcher.calls(), 0);
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_complete_upload_without_worksheet_is_unprocessable() {
    let (server, _, store) = setup(StubFetcher::bytes(empty_xlsx_workbook()));

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("notes.xlsx", XLSX, None))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.text(), "Worksheet not found");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_complete_upload_retrieval_failure_is_bad_gateway() {
    let (server, _, store) = setup(StubFetcher::failing());

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("notes.xlsx", XLSX, None))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(response.text(), "Failed to retrieve the uploaded file");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_complete_upload_records_documents_without_rows() {
    let docx = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    let (server, _, store) = setup(StubFetcher::bytes(b"PK\x03\x04 not parsed".to_vec()));

    let response = server
        .post("/api/v1/uploads/complete")
        .json(&completion_event("appreciations.docx", docx, None))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["kind"], "document");
    assert!(body.get("rows").is_none());
    assert_eq!(store.records().len(), 1);
}

mod signed_callbacks {
    use super::*;

    fn signed_setup() -> (axum_test::TestServer, Arc<InMemoryConfigurationStore>) {
        let fetcher = Arc::new(StubFetcher::bytes(grades_workbook()));
        let store = Arc::new(InMemoryConfigurationStore::default());
        let mut config = create_test_config();
        config.callback.signing_secret = Some(SECRET.to_string());
        (create_test_app(config, fetcher, store.clone()), store)
    }

    fn body() -> Vec<u8> {
        serde_json::to_vec(&completion_event("notes.xlsx", XLSX, None)).unwrap()
    }

    #[tokio::test]
    async fn test_valid_signature_is_accepted() {
        let (server, store) = signed_setup();
        let body = body();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign_payload(timestamp, &body, SECRET).unwrap();

        let response = server
            .post("/api/v1/uploads/complete")
            .add_header(TIMESTAMP_HEADER, timestamp.to_string())
            .add_header(SIGNATURE_HEADER, signature)
            .bytes(body.into())
            .await;

        response.assert_status_ok();
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_signature_is_unauthorized() {
        let (server, store) = signed_setup();

        let response = server.post("/api/v1/uploads/complete").bytes(body().into()).await;

        response.assert_status_unauthorized();
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_signature_over_other_body_is_unauthorized() {
        let (server, store) = signed_setup();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign_payload(timestamp, b"{}", SECRET).unwrap();

        let response = server
            .post("/api/v1/uploads/complete")
            .add_header(TIMESTAMP_HEADER, timestamp.to_string())
            .add_header(SIGNATURE_HEADER, signature)
            .bytes(body().into())
            .await;

        response.assert_status_unauthorized();
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_signature_is_unauthorized() {
        let (server, _) = signed_setup();
        let body = body();
        let timestamp = chrono::Utc::now().timestamp() - 3600;
        let signature = sign_payload(timestamp, &body, SECRET).unwrap();

        let response = server
            .post("/api/v1/uploads/complete")
            .add_header(TIMESTAMP_HEADER, timestamp.to_string())
            .add_header(SIGNATURE_HEADER, signature)
            .bytes(body.into())
            .await;

        response.assert_status_unauthorized();
    }
}

mod configurations {
    use super::*;

    #[tokio::test]
    async fn test_get_configuration() {
        let (server, _, store) = setup(StubFetcher::failing());
        let existing = store.insert("https://files.example.com/f/notes.xlsx", "notes.xlsx");

        let response = server.get(&format!("/api/v1/configurations/{}", existing.id)).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], existing.id.to_string());
        assert_eq!(body["excelUrl"], "https://files.example.com/f/notes.xlsx");
        assert_eq!(body["fileName"], "notes.xlsx");
    }

    #[tokio::test]
    async fn test_get_unknown_configuration_is_not_found() {
        let (server, _, _) = setup(StubFetcher::failing());

        let response = server.get(&format!("/api/v1/configurations/{}", uuid::Uuid::new_v4())).await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_list_configurations_paginates() {
        let (server, _, store) = setup(StubFetcher::failing());
        for i in 0..3 {
            store.insert(&format!("https://files.example.com/f/{i}.xlsx"), &format!("{i}.xlsx"));
        }

        let response = server.get("/api/v1/configurations").await;
        response.assert_status_ok();
        let all: Vec<Value> = response.json();
        assert_eq!(all.len(), 3);

        let response = server.get("/api/v1/configurations?skip=1&limit=1").await;
        response.assert_status_ok();
        let page: Vec<Value> = response.json();
        assert_eq!(page.len(), 1);
    }
}
