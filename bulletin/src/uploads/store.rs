//! The configuration record store used by the upload pipeline.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    db::{
        errors::Result,
        handlers::{Configurations, Repository},
        models::configurations::{
            ConfigurationCreateDBRequest, ConfigurationDBResponse, ConfigurationFilter, ConfigurationUpdateDBRequest,
        },
    },
    types::ConfigurationId,
};

/// Persistence of configuration records.
///
/// Backed by PostgreSQL in production ([`PgConfigurationStore`]); tests use an in-memory store.
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    async fn create(&self, request: &ConfigurationCreateDBRequest) -> Result<ConfigurationDBResponse>;

    /// Overwrite an existing record. Fails with `DbError::NotFound` when `id` is unknown.
    async fn update(&self, id: ConfigurationId, request: &ConfigurationUpdateDBRequest) -> Result<ConfigurationDBResponse>;

    async fn get(&self, id: ConfigurationId) -> Result<Option<ConfigurationDBResponse>>;

    async fn list(&self, filter: &ConfigurationFilter) -> Result<Vec<ConfigurationDBResponse>>;
}

#[derive(Debug, Clone)]
pub struct PgConfigurationStore {
    pool: PgPool,
}

impl PgConfigurationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigurationStore for PgConfigurationStore {
    async fn create(&self, request: &ConfigurationCreateDBRequest) -> Result<ConfigurationDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Configurations::new(&mut conn).create(request).await
    }

    async fn update(&self, id: ConfigurationId, request: &ConfigurationUpdateDBRequest) -> Result<ConfigurationDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Configurations::new(&mut conn).update(id, request).await
    }

    async fn get(&self, id: ConfigurationId) -> Result<Option<ConfigurationDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Configurations::new(&mut conn).get_by_id(id).await
    }

    async fn list(&self, filter: &ConfigurationFilter) -> Result<Vec<ConfigurationDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Configurations::new(&mut conn).list(filter).await
    }
}
