use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};

use crate::{
    AppState,
    api::models::uploads::{UploadCompleteEvent, UploadCompleteResponse},
    db::errors::DbError,
    errors::{Error, Result},
    uploads::{CompletedUpload, UploadError, signing},
};

/// Upload completion callback.
///
/// Called by the storage service once a file has been received. The file is retrieved, checked
/// (spreadsheets must have a readable first worksheet) and recorded on a configuration.
#[utoipa::path(
    post,
    path = "/uploads/complete",
    tag = "uploads",
    summary = "Complete upload",
    request_body = UploadCompleteEvent,
    params(
        ("x-upload-timestamp" = Option<i64>, Header, description = "Unix timestamp of the callback (required when signing is configured)"),
        ("x-upload-signature" = Option<String>, Header, description = "`v1,<base64 HMAC-SHA256>` over `{timestamp}.{body}` (required when signing is configured)"),
    ),
    responses(
        (status = 200, description = "Upload recorded", body = UploadCompleteResponse),
        (status = 400, description = "Malformed event or unsupported content type"),
        (status = 401, description = "Missing or invalid callback signature"),
        (status = 404, description = "Configuration not found"),
        (status = 413, description = "File exceeds the size limit for its content type"),
        (status = 422, description = "Spreadsheet could not be read"),
        (status = 502, description = "File could not be retrieved from the storage service"),
        (status = 500, description = "Internal server error")
    ),
    security(("CallbackSignature" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn complete_upload(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<UploadCompleteResponse>> {
    // The signature covers the raw body, so it is checked before deserializing
    if let Some(secret) = &state.config.callback.signing_secret {
        let now = chrono::Utc::now().timestamp();
        signing::verify_headers(&headers, &body, secret, state.config.callback.tolerance, now)?;
    }

    let event: UploadCompleteEvent = serde_json::from_slice(&body).map_err(|e| Error::BadRequest {
        message: format!("Invalid upload event: {e}"),
    })?;
    let upload = CompletedUpload::try_from(event)?;
    let config_id = upload.config_id;

    let outcome = state.uploads.handle(upload).await.map_err(|err| match (err, config_id) {
        (UploadError::Persistence(DbError::NotFound), Some(id)) => Error::NotFound {
            resource: "Configuration".to_string(),
            id: id.to_string(),
        },
        (err, _) => Error::Upload(err),
    })?;

    Ok(Json(outcome.into()))
}
