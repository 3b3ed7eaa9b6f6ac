//! Persistent store adapters shared by the workflows.
//!
//! `postgres` is the production store. `memory` keeps the same contracts in
//! process for tests and the CLI demo.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryStore, ReviewFault};
pub use postgres::PgStore;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    /// A foreign key to `users` was violated: the referenced user is missing,
    /// or a user that is still referenced was deleted.
    #[error("user reference violated")]
    ReferenceViolation,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored row is invalid: {0}")]
    InvalidRow(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict;
            }
            if db_err.is_foreign_key_violation() {
                return Self::ReferenceViolation;
            }
        }
        Self::Database(err)
    }
}
