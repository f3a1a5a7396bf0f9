//! Completion of uploads reported by the storage service.
//!
//! When the storage service finishes receiving a file it calls back with the file's URL, name and
//! the input the client attached to the upload. [`UploadCompletionHandler::handle`] then runs one
//! sequential chain:
//!
//! 1. **route**: the content type is looked up in the [`UploadRouter`]; unknown types and
//!    declared sizes above the limit are rejected before anything is fetched
//! 2. **fetch**: the bytes are downloaded once through [`FetchFile`]
//! 3. **parse**: spreadsheets must have a readable first worksheet; documents are not parsed
//! 4. **persist**: a new configuration is created, or the one named by the client is repointed
//!
//! Any failure aborts the chain, so nothing is written unless every earlier step succeeded.

pub mod errors;
pub mod fetch;
pub mod router;
pub mod signing;
pub mod spreadsheet;
pub mod store;

use std::sync::Arc;

use tracing::{info, instrument};
use url::Url;

pub use errors::{Rejection, UploadError};
pub use fetch::{FetchError, FetchFile, FetchFileReqwest};
pub use router::{FileKind, Route, UploadRouter};
pub use spreadsheet::{CellValue, ParseError, SheetRows};
pub use store::{ConfigurationStore, PgConfigurationStore};

use crate::{
    db::models::configurations::{ConfigurationCreateDBRequest, ConfigurationUpdateDBRequest},
    types::{ConfigurationId, abbrev_uuid},
};

/// A file the storage service finished receiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    pub url: Url,
    pub name: String,
    /// Content type reported by the storage service, if any
    pub content_type: Option<String>,
    /// Size reported by the storage service, if any
    pub size: Option<u64>,
    /// Configuration to repoint at this file; a new one is created when absent
    pub config_id: Option<ConfigurationId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub config_id: ConfigurationId,
    pub kind: FileKind,
    /// Rows of the first worksheet, for spreadsheets
    pub rows: Option<SheetRows>,
}

pub struct UploadCompletionHandler {
    router: UploadRouter,
    fetcher: Arc<dyn FetchFile>,
    store: Arc<dyn ConfigurationStore>,
}

impl UploadCompletionHandler {
    pub fn new(router: UploadRouter, fetcher: Arc<dyn FetchFile>, store: Arc<dyn ConfigurationStore>) -> Self {
        Self { router, fetcher, store }
    }

    pub fn router(&self) -> &UploadRouter {
        &self.router
    }

    #[instrument(skip(self, upload), fields(file_name = %upload.name, config_id = tracing::field::Empty), err)]
    pub async fn handle(&self, upload: CompletedUpload) -> Result<UploadOutcome, UploadError> {
        if let Some(id) = upload.config_id {
            tracing::Span::current().record("config_id", abbrev_uuid(&id).as_str());
        }

        let route = self.router.resolve(upload.content_type.as_deref(), &upload.name)?;
        if let Some(size) = upload.size {
            route.check_size(size)?;
        }

        let bytes = self
            .fetcher
            .fetch(&upload.url, route.max_file_size.as_u64())
            .await
            .map_err(|source| UploadError::Retrieval {
                url: upload.url.clone(),
                source,
            })?;

        let rows = match route.kind {
            FileKind::Spreadsheet => Some(spreadsheet::parse(bytes).await?),
            FileKind::Document => None,
        };

        let excel_url = upload.url.to_string();
        let configuration = match upload.config_id {
            Some(id) => {
                self.store
                    .update(
                        id,
                        &ConfigurationUpdateDBRequest {
                            excel_url,
                            file_name: upload.name,
                        },
                    )
                    .await?
            }
            None => {
                self.store
                    .create(&ConfigurationCreateDBRequest {
                        excel_url,
                        file_name: upload.name,
                    })
                    .await?
            }
        };

        info!(
            config_id = %abbrev_uuid(&configuration.id),
            content_type = %route.content_type,
            rows = rows.as_ref().map(SheetRows::len),
            "Upload recorded"
        );

        Ok(UploadOutcome {
            config_id: configuration.id,
            kind: route.kind,
            rows,
        })
    }
}
