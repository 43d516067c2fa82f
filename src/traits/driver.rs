use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RawQueryResult, SqlValue};

/// Trait for statement execution backends.
///
/// Implementations own a logical connection (or a stand-in, for tests) and
/// execute statements that already use Postgres-style `$1` placeholders;
/// named-parameter rewriting happens above this seam.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Execute a SQL statement with the given positional parameters.
    ///
    /// `description` is a short human-readable label for the operation,
    /// carried into log events and error diagnostics.
    async fn execute(
        &self,
        description: &str,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<RawQueryResult>;
}
