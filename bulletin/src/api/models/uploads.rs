//! API request/response models for the upload completion callback.

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::errors::Error;
use crate::types::ConfigurationId;
use crate::uploads::{CompletedUpload, FileKind, UploadOutcome};

/// Event sent by the storage service once a file transfer has finished.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadCompleteEvent {
    /// Data attached by the client when it started the upload
    #[serde(default)]
    pub metadata: Option<UploadMetadata>,
    pub file: UploadedFile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UploadMetadata {
    #[serde(default)]
    pub input: Option<UploadInput>,
}

/// Client-supplied input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadInput {
    /// Configuration to repoint at the uploaded file. A new configuration is created when absent.
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub config_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadedFile {
    /// Where the uploaded bytes can be retrieved from
    #[schema(value_type = String, format = Uri, example = "https://files.example.com/f/3f2a9c")]
    pub url: Url,
    /// Original file name
    #[schema(example = "notes-trimestre-1.xlsx")]
    pub name: String,
    /// Content type reported by the storage service
    #[serde(rename = "type", default)]
    #[schema(example = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")]
    pub content_type: Option<String>,
    /// Size in bytes
    #[serde(default)]
    pub size: Option<u64>,
}

impl UploadCompleteEvent {
    /// The `configId` the client supplied, if any. Blank values count as absent.
    pub fn config_id(&self) -> Result<Option<ConfigurationId>, Error> {
        let raw = self
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.input.as_ref())
            .and_then(|input| input.config_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty());

        raw.map(|id| {
            ConfigurationId::parse_str(id).map_err(|_| Error::BadRequest {
                message: format!("Invalid configId '{id}'"),
            })
        })
        .transpose()
    }
}

impl TryFrom<UploadCompleteEvent> for CompletedUpload {
    type Error = Error;

    fn try_from(event: UploadCompleteEvent) -> Result<Self, Self::Error> {
        let config_id = event.config_id()?;
        Ok(CompletedUpload {
            url: event.file.url,
            name: event.file.name,
            content_type: event.file.content_type,
            size: event.file.size,
            config_id,
        })
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteResponse {
    /// The created or updated configuration; use it for later uploads in the same flow
    #[schema(value_type = String, format = "uuid")]
    pub config_id: ConfigurationId,
    pub kind: FileKind,
    /// Number of rows read from the first worksheet (spreadsheets only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
}

impl From<UploadOutcome> for UploadCompleteResponse {
    fn from(outcome: UploadOutcome) -> Self {
        Self {
            config_id: outcome.config_id,
            kind: outcome.kind,
            rows: outcome.rows.as_ref().map(|rows| rows.len()),
        }
    }
}
