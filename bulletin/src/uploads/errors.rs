use thiserror::Error;
use url::Url;

use super::fetch::FetchError;
use super::spreadsheet::ParseError;
use crate::config::ByteSize;
use crate::db::errors::DbError;

/// Why an upload was refused before its bytes were retrieved or read.
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("Unsupported content type '{content_type}'")]
    UnsupportedContentType { content_type: String },

    #[error("File of {size} bytes exceeds the limit of {limit}")]
    TooLarge { size: u64, limit: ByteSize },
}

/// Failure of a single upload completion. Nothing is persisted when one of these is returned.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The uploaded bytes could not be fetched from the storage service
    #[error("Failed to retrieve {url}")]
    Retrieval {
        url: Url,
        #[source]
        source: FetchError,
    },

    /// The bytes are not a readable workbook, or it has no worksheet to read
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The configuration record could not be created or updated
    #[error("Failed to persist configuration")]
    Persistence(#[from] DbError),
}
