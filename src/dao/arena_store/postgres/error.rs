//! Error types of the PostgreSQL storage implementation.

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`PostgresDaoError`] failures.
pub type PostgresResult<T> = Result<T, PostgresDaoError>;

/// Failures that can occur while interacting with PostgreSQL.
#[derive(Debug, Error)]
pub enum PostgresDaoError {
    /// Required environment variable is missing.
    #[error("missing PostgreSQL environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The pool could not be opened or did not answer the initial ping.
    #[error("PostgreSQL connection failed after {attempts} attempt(s)")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
    #[error("PostgreSQL health check failed")]
    HealthPing {
        #[source]
        source: sqlx::Error,
    },
    /// Creating a table or an index failed.
    #[error("failed to ensure schema object `{object}`")]
    EnsureSchema {
        object: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// A statement failed; `operation` names the store method.
    #[error("PostgreSQL query `{operation}` failed")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl PostgresDaoError {
    pub(super) fn query(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| PostgresDaoError::Query { operation, source }
    }

    /// Whether the failure means the database cannot be reached at all.
    fn is_connectivity(&self) -> bool {
        match self {
            PostgresDaoError::MissingEnvVar { .. }
            | PostgresDaoError::Connect { .. }
            | PostgresDaoError::HealthPing { .. } => true,
            PostgresDaoError::EnsureSchema { source, .. }
            | PostgresDaoError::Query { source, .. } => matches!(
                source,
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
            ),
        }
    }
}

impl From<PostgresDaoError> for StorageError {
    fn from(err: PostgresDaoError) -> Self {
        if err.is_connectivity() {
            StorageError::unavailable(err.to_string(), err)
        } else {
            StorageError::backend(err.to_string(), err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_reported_as_unavailable() {
        let err = PostgresDaoError::Query {
            operation: "find_user",
            source: sqlx::Error::PoolTimedOut,
        };
        assert!(matches!(
            StorageError::from(err),
            StorageError::Unavailable { .. }
        ));
    }

    #[test]
    fn statement_failures_are_reported_as_backend_errors() {
        let err = PostgresDaoError::Query {
            operation: "record_vote",
            source: sqlx::Error::RowNotFound,
        };
        assert!(matches!(StorageError::from(err), StorageError::Backend { .. }));
    }
}
