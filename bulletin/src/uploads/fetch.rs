//! Retrieval of uploaded bytes from the storage service.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::RetrievalConfig;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Storage service responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("File exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// A trait for fetching the bytes of a completed upload.
/// In practice this is a single HTTP GET against the URL the storage service reported, see
/// `FetchFileReqwest`. Tests substitute stubs that count calls.
#[async_trait]
pub trait FetchFile: Send + Sync {
    /// Download the whole file, refusing anything larger than `max_bytes`.
    async fn fetch(&self, url: &Url, max_bytes: u64) -> Result<Bytes, FetchError>;
}

/// The concrete implementation of `FetchFile`.
pub struct FetchFileReqwest {
    client: Client,
}

impl FetchFileReqwest {
    pub fn new(config: &RetrievalConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FetchFile for FetchFileReqwest {
    #[instrument(skip(self, url), fields(url = %url), err)]
    async fn fetch(&self, url: &Url, max_bytes: u64) -> Result<Bytes, FetchError> {
        let mut response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        if let Some(length) = response.content_length()
            && length > max_bytes
        {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }

        // Content-Length may be absent or wrong, so the limit is enforced while reading too
        let mut buffer = BytesMut::with_capacity(response.content_length().unwrap_or(0).min(max_bytes) as usize);
        while let Some(chunk) = response.chunk().await? {
            if buffer.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(FetchError::TooLarge { limit: max_bytes });
            }
            buffer.extend_from_slice(&chunk);
        }

        debug!(bytes = buffer.len(), "Retrieved uploaded file");
        Ok(buffer.freeze())
    }
}
