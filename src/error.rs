use thiserror::Error;

use crate::types::SqlValue;

/// Error type for pgbind operations
#[derive(Debug, Error)]
pub enum PgBindError {
    /// A query method was called before `init` established a connection.
    #[error("Not connected")]
    NotConnected,

    /// `init` was called while a connection is already live.
    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The driver rejected a statement. Carries no statement context; the
    /// reconnecting driver wraps it into `ExecutionFailed` before it
    /// surfaces to a caller.
    #[error("Query failed: {message}")]
    QueryFailed {
        code: Option<String>,
        message: String,
    },

    /// A statement failed after the one reconnect-and-retry cycle.
    #[error("Execution failed ({description}): {message}")]
    ExecutionFailed {
        description: String,
        sql: String,
        params: Vec<SqlValue>,
        code: Option<String>,
        message: String,
    },

    /// Re-establishing the connection failed. Fatal for the current call;
    /// the original statement is not retried.
    #[error("Reconnect failed ({description}): {message}")]
    ReconnectFailed {
        description: String,
        message: String,
    },

    /// An `_or_fail` accessor found zero rows or a NULL value.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Type mismatch for column '{column}': expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("Transaction already active")]
    TransactionAlreadyActive,

    #[error("Code space exhausted after {attempts} attempt(s)")]
    CodeSpaceExhausted { attempts: usize },

    /// An insert returned no generated key, or a non-positive one.
    #[error("No generated id returned for insert into '{table}'")]
    MissingGeneratedId { table: String },

    #[error("Statement timed out ({0})")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,
}

impl PgBindError {
    /// Driver error code attached to the failure, when one is known.
    pub fn driver_code(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { code, .. } | Self::ExecutionFailed { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for pgbind operations
pub type Result<T> = std::result::Result<T, PgBindError>;
