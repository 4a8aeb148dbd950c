//! Custom error types for the common library
//!
//! This module defines the errors raised by the database and identifier
//! helpers shared across services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while acquiring or opening a connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A bound parameter could not be encoded
    #[error("Database argument error: {0}")]
    Argument(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Whether the failure was caused by the values a caller supplied rather
    /// than by the database itself.
    ///
    /// SQLSTATE class `22` (data exception) and `23` (integrity constraint
    /// violation) are attributed to the caller.
    pub fn is_caller_input(&self) -> bool {
        match self {
            DatabaseError::Query(SqlxError::Database(db)) => db
                .code()
                .map(|code| code.starts_with("22") || code.starts_with("23"))
                .unwrap_or(false),
            DatabaseError::Argument(_) => true,
            _ => false,
        }
    }

    /// Whether a unique or primary key constraint rejected the write
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::Query(SqlxError::Database(db)) if db.is_unique_violation()
        )
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised by [`crate::ids::IdObfuscator`]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    /// The alphabet or minimum length was rejected
    #[error("Invalid identifier configuration: {0}")]
    Configuration(String),

    /// The payload could not be encoded
    #[error("Could not encode identifier: {0}")]
    Encode(String),

    /// The token is malformed or was produced by a different configuration
    #[error("Could not decode identifier")]
    Decode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError as SqlxDatabaseError, ErrorKind};
    use std::{borrow::Cow, fmt};

    #[derive(Debug)]
    struct ServerError {
        code: &'static str,
        unique: bool,
    }

    impl fmt::Display for ServerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "server error {}", self.code)
        }
    }

    impl std::error::Error for ServerError {}

    impl SqlxDatabaseError for ServerError {
        fn message(&self) -> &str {
            "server error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    fn server_error(code: &'static str, unique: bool) -> DatabaseError {
        DatabaseError::Query(SqlxError::Database(Box::new(ServerError { code, unique })))
    }

    #[test]
    fn test_duplicate_key_is_unique_violation() {
        let err = server_error("23000", true);
        assert!(err.is_unique_violation());
        assert!(err.is_caller_input());
    }

    #[test]
    fn test_other_server_errors_are_not_unique_violations() {
        let err = server_error("22001", false);
        assert!(!err.is_unique_violation());
        assert!(err.is_caller_input());

        let err = server_error("HY000", false);
        assert!(!err.is_unique_violation());
        assert!(!err.is_caller_input());

        assert!(!DatabaseError::Argument("x".to_string()).is_unique_violation());
    }

    #[test]
    fn test_configuration_error_is_not_caller_input() {
        let err = DatabaseError::Configuration("bad url".to_string());
        assert!(!err.is_caller_input());
    }

    #[test]
    fn test_pool_timeout_is_not_caller_input() {
        let err = DatabaseError::Connection(SqlxError::PoolTimedOut);
        assert!(!err.is_caller_input());
        let err = DatabaseError::Query(SqlxError::RowNotFound);
        assert!(!err.is_caller_input());
    }

    #[test]
    fn test_argument_error_is_caller_input() {
        let err = DatabaseError::Argument("unsupported value".to_string());
        assert!(err.is_caller_input());
    }
}
