//! API request/response models.

pub mod configurations;
pub mod pagination;
pub mod uploads;
