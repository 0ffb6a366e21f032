//! Core data models for the image upload service.
//!
//! These entities represent the logical structure of containers and objects.
//! They map cleanly to database tables via `sqlx::FromRow` and serialize
//! naturally as JSON via `serde`.

pub mod container;
pub mod object;
