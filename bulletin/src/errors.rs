use crate::db::errors::DbError;
use crate::uploads::{ParseError, Rejection, UploadError, signing::SignatureError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Callback signature missing or invalid
    #[error("Not authenticated: {0}")]
    Unauthenticated(#[from] SignatureError),

    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Upload completion failure
    #[error(transparent)]
    Upload(#[from] UploadError),
}

fn db_status(err: &DbError) -> StatusCode {
    match err {
        DbError::NotFound => StatusCode::NOT_FOUND,
        DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
        DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
        DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => db_status(db_err),
            Error::Upload(upload_err) => match upload_err {
                UploadError::Rejected(Rejection::UnsupportedContentType { .. }) => StatusCode::BAD_REQUEST,
                UploadError::Rejected(Rejection::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
                UploadError::Retrieval { .. } => StatusCode::BAD_GATEWAY,
                UploadError::Parse(ParseError::Interrupted(_)) => StatusCode::INTERNAL_SERVER_ERROR,
                UploadError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
                UploadError::Persistence(DbError::NotFound) => StatusCode::NOT_FOUND,
                UploadError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated(reason) => reason.to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Upload(upload_err) => match upload_err {
                UploadError::Rejected(rejection) => rejection.to_string(),
                UploadError::Retrieval { .. } => "Failed to retrieve the uploaded file".to_string(),
                UploadError::Parse(ParseError::WorksheetNotFound) => "Worksheet not found".to_string(),
                UploadError::Parse(ParseError::Interrupted(_)) => "Failed to process the uploaded file".to_string(),
                UploadError::Parse(_) => "The uploaded spreadsheet could not be read".to_string(),
                UploadError::Persistence(DbError::NotFound) => "Configuration not found".to_string(),
                UploadError::Persistence(_) => "Failed to process the uploaded file".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Internal service error: {}", display_chain(&self));
        } else {
            match &self {
                Error::Unauthenticated(_) => tracing::info!("Authentication error: {}", self),
                Error::Upload(_) => tracing::warn!("Upload rejected: {}", display_chain(&self)),
                _ => tracing::debug!("Client error: {}", self),
            }
        }

        (status, self.user_message()).into_response()
    }
}

/// Render an error with all of its sources, `outer: inner: innermost`.
pub fn display_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
