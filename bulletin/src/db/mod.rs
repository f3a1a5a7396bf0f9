//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL, following the
//! Repository pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Upload pipeline │  (uploads::ConfigurationStore)
//! └────────┬────────┘
//!          │
//!          ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Transactions
//!
//! Repositories borrow a connection, so they work the same on a pooled connection or inside a
//! transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Configurations::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in the crate's `migrations/` directory and run on startup through
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
