//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Uploads** (`/api/v1/uploads/complete`): completion callback from the storage service
//! - **Configurations** (`/api/v1/configurations/*`): read access to configuration records
//!
//! All endpoints are documented with `utoipa`; the document is served at `/api-docs/openapi.json`
//! and rendered at `/docs`.

pub mod handlers;
pub mod models;
