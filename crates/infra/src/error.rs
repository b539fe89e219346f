//! Storage error model and SQLx error mapping.

use thiserror::Error;

use splitledger_core::DomainError;

/// Storage operation error.
///
/// These are infrastructure errors; a `Domain` error only surfaces when a
/// stored row fails to rebuild into a valid domain value.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub(crate) fn poisoned() -> Self {
        StoreError::Storage("lock poisoned".to_string())
    }
}

/// Map SQLx errors to `StoreError`.
///
/// | Postgres code | Meaning | `StoreError` |
/// |---|---|---|
/// | `23505` | unique violation | `Conflict` |
/// | `23503` | foreign key violation | `Storage` |
/// | `23514` | check constraint violation | `Storage` |
/// | other / non-database | | `Storage` |
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                // Foreign key / check constraint: the write referenced bad data.
                Some("23503") | Some("23514") => StoreError::Storage(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => {
            StoreError::NotFound(format!("unexpected row not found in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Check if an error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
