//! Test utilities: in-memory collaborators, workbook fixtures and a ready-made test server.

use std::io::{Cursor, Write};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use chrono::Utc;
use reqwest::StatusCode;
use rust_xlsxwriter::Workbook;
use url::Url;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    AppState, Application,
    config::Config,
    db::{
        errors::{DbError, Result},
        models::configurations::{
            Configuration, ConfigurationCreateDBRequest, ConfigurationDBResponse, ConfigurationFilter, ConfigurationUpdateDBRequest,
        },
    },
    types::ConfigurationId,
    uploads::{CellValue, ConfigurationStore, FetchError, FetchFile, UploadCompletionHandler, UploadRouter},
};

/// Configuration store held in memory that counts the calls made through the trait.
#[derive(Default)]
pub struct InMemoryConfigurationStore {
    records: Mutex<Vec<Configuration>>,
    creates: AtomicUsize,
    updates: AtomicUsize,
    reads: AtomicUsize,
}

impl InMemoryConfigurationStore {
    /// Seed a record without counting it as a call.
    pub fn insert(&self, excel_url: &str, file_name: &str) -> Configuration {
        let now = Utc::now();
        let configuration = Configuration {
            id: uuid::Uuid::new_v4(),
            excel_url: excel_url.to_string(),
            file_name: file_name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(configuration.clone());
        configuration
    }

    pub fn records(&self) -> Vec<Configuration> {
        self.records.lock().unwrap().clone()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Every call made through [`ConfigurationStore`].
    pub fn calls(&self) -> usize {
        self.creates() + self.updates() + self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigurationStore for InMemoryConfigurationStore {
    async fn create(&self, request: &ConfigurationCreateDBRequest) -> Result<ConfigurationDBResponse> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.insert(&request.excel_url, &request.file_name))
    }

    async fn update(&self, id: ConfigurationId, request: &ConfigurationUpdateDBRequest) -> Result<ConfigurationDBResponse> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let record = records.iter_mut().find(|record| record.id == id).ok_or(DbError::NotFound)?;
        record.excel_url = request.excel_url.clone();
        record.file_name = request.file_name.clone();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn get(&self, id: ConfigurationId) -> Result<Option<ConfigurationDBResponse>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().iter().find(|record| record.id == id).cloned())
    }

    async fn list(&self, filter: &ConfigurationFilter) -> Result<Vec<ConfigurationDBResponse>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }
}

/// Fetcher that answers every request with the same bytes, or with a storage-service error.
pub struct StubFetcher {
    response: Option<Bytes>,
    calls: AtomicUsize,
    last_limit: Mutex<Option<u64>>,
}

impl StubFetcher {
    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            response: Some(bytes.into()),
            calls: AtomicUsize::new(0),
            last_limit: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
            last_limit: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> Option<u64> {
        *self.last_limit.lock().unwrap()
    }
}

#[async_trait]
impl FetchFile for StubFetcher {
    async fn fetch(&self, _url: &Url, max_bytes: u64) -> std::result::Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(max_bytes);
        self.response.clone().ok_or_else(|| FetchError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "storage unavailable".to_string(),
        })
    }
}

/// Build an `.xlsx` workbook with the given worksheets, in order. Empty cells are left unwritten.
pub fn xlsx_workbook(sheets: &[(&str, Vec<Vec<CellValue>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();

        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    CellValue::Empty => {}
                    CellValue::String(s) | CellValue::Error(s) => {
                        worksheet.write_string(r, c, s.as_str()).unwrap();
                    }
                    CellValue::Int(i) => {
                        worksheet.write_number(r, c, *i as f64).unwrap();
                    }
                    CellValue::Float(f) | CellValue::DateTime(f) => {
                        worksheet.write_number(r, c, *f).unwrap();
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(r, c, *b).unwrap();
                    }
                }
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// A structurally valid `.xlsx` package whose workbook declares no worksheets.
pub fn empty_xlsx_workbook() -> Vec<u8> {
    const PARTS: [(&str, &str); 4] = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets/></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#,
        ),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (path, content) in PARTS {
        zip.start_file(path, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    }
}

/// A test server backed by in-memory collaborators.
pub fn create_test_app(config: Config, fetcher: Arc<StubFetcher>, store: Arc<InMemoryConfigurationStore>) -> TestServer {
    let router = UploadRouter::from_config(&config.uploads).expect("Failed to build upload router");
    let uploads = Arc::new(UploadCompletionHandler::new(router, fetcher, store.clone()));

    let state = AppState::builder().config(config).store(store).uploads(uploads).build();

    Application::from_state(state).into_test_server()
}
