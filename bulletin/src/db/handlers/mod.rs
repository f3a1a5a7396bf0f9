//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction and implements the [`Repository`]
//! trait for one table.
//!
//! - [`Configurations`]: bulletin-generation configurations
//!
//! ```ignore
//! use bulletin::db::handlers::{Configurations, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Configurations::new(&mut tx);
//!     let configs = repo.list(&Default::default()).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod configurations;
pub mod repository;

pub use configurations::Configurations;
pub use repository::Repository;
