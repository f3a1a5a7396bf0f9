//! Content-type routing for completed uploads.
//!
//! The [`UploadRouter`] is built once from [`UploadsConfig`](crate::config::UploadsConfig) and
//! handed to the [`UploadCompletionHandler`](super::UploadCompletionHandler). It decides whether
//! an upload is accepted at all, how it is processed, and how large it may be.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::Rejection;
use crate::config::{ByteSize, UploadsConfig};

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_CONTENT_TYPE: &str = "application/vnd.ms-excel";
pub const DOCX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOC_CONTENT_TYPE: &str = "application/msword";

const OCTET_STREAM: &str = "application/octet-stream";

/// How an accepted upload is processed after retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Parsed as a workbook; its first worksheet must be readable.
    Spreadsheet,
    /// Stored as-is.
    Document,
}

/// Infer the kind of well-known office content types.
pub fn infer_kind(content_type: &str) -> Option<FileKind> {
    let content_type = normalize(content_type);
    if content_type.contains("spreadsheet") || content_type.starts_with(XLS_CONTENT_TYPE) {
        Some(FileKind::Spreadsheet)
    } else if content_type.contains("wordprocessing") || content_type == DOC_CONTENT_TYPE {
        Some(FileKind::Document)
    } else {
        None
    }
}

/// Lowercase a content type and drop any parameters (`; charset=...`).
fn normalize(content_type: &str) -> String {
    content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// An accepted content type together with its processing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub content_type: String,
    pub kind: FileKind,
    pub max_file_size: ByteSize,
}

impl Route {
    pub fn check_size(&self, size: u64) -> Result<(), Rejection> {
        if size > self.max_file_size.as_u64() {
            return Err(Rejection::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadRouter {
    routes: BTreeMap<String, Route>,
}

impl UploadRouter {
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Self {
        let routes = routes
            .into_iter()
            .map(|route| {
                let content_type = normalize(&route.content_type);
                (content_type.clone(), Route { content_type, ..route })
            })
            .collect();
        Self { routes }
    }

    pub fn from_config(config: &UploadsConfig) -> anyhow::Result<Self> {
        let routes = config
            .file_types
            .iter()
            .map(|(content_type, file_type)| {
                let kind = file_type
                    .kind
                    .or_else(|| infer_kind(content_type))
                    .ok_or_else(|| anyhow::anyhow!("no processing kind configured for content type '{content_type}'"))?;
                Ok(Route {
                    content_type: content_type.clone(),
                    kind,
                    max_file_size: file_type.max_file_size,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self::new(routes))
    }

    /// Find the route for an upload.
    ///
    /// The content type declared by the storage service wins. When it is missing or only says
    /// `application/octet-stream`, the type is guessed from the file name's extension.
    pub fn resolve(&self, declared: Option<&str>, file_name: &str) -> Result<&Route, Rejection> {
        let declared = declared.map(normalize).filter(|ct| !ct.is_empty() && ct != OCTET_STREAM);

        let content_type = declared
            .or_else(|| mime_guess::from_path(file_name).first_raw().map(normalize))
            .ok_or_else(|| Rejection::UnsupportedContentType {
                content_type: OCTET_STREAM.to_string(),
            })?;

        self.routes
            .get(&content_type)
            .ok_or(Rejection::UnsupportedContentType { content_type })
    }

    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
