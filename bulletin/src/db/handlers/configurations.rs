//! Database repository for bulletin-generation configurations.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::configurations::{
            Configuration, ConfigurationCreateDBRequest, ConfigurationDBResponse, ConfigurationFilter, ConfigurationUpdateDBRequest,
        },
    },
    types::{ConfigurationId, abbrev_uuid},
};

pub struct Configurations<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Configurations<'c> {
    type CreateRequest = ConfigurationCreateDBRequest;
    type UpdateRequest = ConfigurationUpdateDBRequest;
    type Response = ConfigurationDBResponse;
    type Id = ConfigurationId;
    type Filter = ConfigurationFilter;

    #[instrument(skip(self, request), fields(file_name = %request.file_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let configuration = sqlx::query_as::<_, Configuration>(
            r#"
            INSERT INTO configurations (excel_url, file_name)
            VALUES ($1, $2)
            RETURNING id, excel_url, file_name, created_at, updated_at
            "#,
        )
        .bind(&request.excel_url)
        .bind(&request.file_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(configuration)
    }

    #[instrument(skip(self), fields(config_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let configuration = sqlx::query_as::<_, Configuration>(
            "SELECT id, excel_url, file_name, created_at, updated_at FROM configurations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(configuration)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let configurations = sqlx::query_as::<_, Configuration>(
            r#"
            SELECT id, excel_url, file_name, created_at, updated_at
            FROM configurations
            ORDER BY created_at DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(configurations)
    }

    /// Overwrites the stored document pointer. Fails with `DbError::NotFound` when no row has `id`.
    #[instrument(skip(self, request), fields(config_id = %abbrev_uuid(&id), file_name = %request.file_name), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let configuration = sqlx::query_as::<_, Configuration>(
            r#"
            UPDATE configurations
            SET excel_url = $2, file_name = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, excel_url, file_name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.excel_url)
        .bind(&request.file_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(configuration)
    }
}

impl<'c> Configurations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
