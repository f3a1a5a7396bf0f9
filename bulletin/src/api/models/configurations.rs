//! API response models for configurations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::configurations::ConfigurationDBResponse;
use crate::types::ConfigurationId;

/// A bulletin-generation configuration and the document it currently points at.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ConfigurationId,
    /// Where the latest uploaded document can be downloaded from
    #[schema(example = "https://files.example.com/f/3f2a9c")]
    pub excel_url: String,
    /// Original name of the latest uploaded document
    #[schema(example = "notes-trimestre-1.xlsx")]
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConfigurationDBResponse> for ConfigurationResponse {
    fn from(db: ConfigurationDBResponse) -> Self {
        Self {
            id: db.id,
            excel_url: db.excel_url,
            file_name: db.file_name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
