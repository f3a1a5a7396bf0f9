use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::models::{configurations::ConfigurationResponse, pagination::Pagination},
    db::models::configurations::ConfigurationFilter,
    errors::{Error, Result},
    types::ConfigurationId,
};

/// List configurations, newest first.
#[utoipa::path(
    get,
    path = "/configurations",
    tag = "configurations",
    summary = "List configurations",
    params(Pagination),
    responses(
        (status = 200, description = "List of configurations", body = Vec<ConfigurationResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_configurations(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ConfigurationResponse>>> {
    let filter = ConfigurationFilter {
        skip: pagination.skip(),
        limit: pagination.limit(),
    };

    let configurations = state.store.list(&filter).await?;

    Ok(Json(configurations.into_iter().map(ConfigurationResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/configurations/{id}",
    tag = "configurations",
    summary = "Get configuration",
    params(
        ("id" = uuid::Uuid, Path, description = "Configuration ID")
    ),
    responses(
        (status = 200, description = "Configuration details", body = ConfigurationResponse),
        (status = 404, description = "Configuration not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_configuration(State(state): State<AppState>, Path(id): Path<ConfigurationId>) -> Result<Json<ConfigurationResponse>> {
    match state.store.get(id).await? {
        Some(configuration) => Ok(Json(configuration.into())),
        None => Err(Error::NotFound {
            resource: "Configuration".to_string(),
            id: id.to_string(),
        }),
    }
}
