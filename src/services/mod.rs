//! Data-access services - typed wrappers around the backend store
//!
//! One function per entity operation, framework-agnostic; the HTTP layer
//! translates errors into status codes. The store's schema is provisioned
//! out of band (schema.sql), so every read tolerates its absence.

pub mod book_service;
pub mod note_service;
pub mod progress_service;

use sea_orm::DbErr;
use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    /// The backing tables have not been created yet (see schema.sql).
    /// Reads recover from this as empty result sets.
    SchemaNotProvisioned,
    /// Resource not found
    NotFound,
    /// Validation error with message
    Validation(String),
    /// Database/persistence error
    Database(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::SchemaNotProvisioned => write!(f, "Backend schema not provisioned"),
            ServiceError::NotFound => write!(f, "Resource not found"),
            ServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        if is_missing_relation(&e) {
            ServiceError::SchemaNotProvisioned
        } else {
            ServiceError::Database(e.to_string())
        }
    }
}

/// Relation-not-found signatures across the backends we may sit on:
/// Postgres reports 42P01 / "relation ... does not exist", SQLite
/// "no such table".
pub(crate) fn is_missing_relation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("42P01")
        || msg.contains("no such table")
        || (msg.contains("relation") && msg.contains("does not exist"))
}
