use std::time::Duration;
use thiserror::Error;

use super::query::{ErrorCategory, StructuredError};

/// Errors surfaced by [`SqlAdapter`](super::SqlAdapter).
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The database rejected the statement. `sql` is the translated text
    /// that was sent, so error positions line up with it.
    #[error("query failed: {error}")]
    QueryExecution { error: StructuredError, sql: String },

    #[error("failed to read column {column}: {source}")]
    Scan {
        column: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("query returned no rows")]
    NoRows,

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
}

impl AdapterError {
    pub fn execution(err: &tokio_postgres::Error, sql: &str) -> Self {
        AdapterError::QueryExecution {
            error: StructuredError::from_pg(err, sql),
            sql: sql.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AdapterError::QueryExecution { error, .. } => error.category,
            AdapterError::Scan { .. } => ErrorCategory::Semantic,
            AdapterError::NoRows => ErrorCategory::Execution,
            AdapterError::Timeout(_) => ErrorCategory::Execution,
            AdapterError::Pool(_) => ErrorCategory::Connection,
        }
    }

    /// True for "zero rows" so callers can treat it as absence, not failure.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, AdapterError::NoRows)
    }
}
