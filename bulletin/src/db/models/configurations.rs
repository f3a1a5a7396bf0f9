//! Database models for bulletin-generation configurations.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::ConfigurationId;

/// Database entity model
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Configuration {
    pub id: ConfigurationId,
    pub excel_url: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating a configuration from a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationCreateDBRequest {
    pub excel_url: String,
    pub file_name: String,
}

/// Request for pointing an existing configuration at a newer upload.
///
/// Both fields are always overwritten; earlier uploads are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationUpdateDBRequest {
    pub excel_url: String,
    pub file_name: String,
}

/// Response type (same as entity for now)
pub type ConfigurationDBResponse = Configuration;

/// Filter for listing configurations
#[derive(Debug, Clone)]
pub struct ConfigurationFilter {
    pub skip: i64,
    pub limit: i64,
}

impl Default for ConfigurationFilter {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}
