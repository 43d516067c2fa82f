use async_trait::async_trait;

use crate::config::ConnectionParams;
use crate::error::Result;
use crate::types::{RawQueryResult, SqlValue};

/// A single live handle to the database.
///
/// The reconnecting driver replaces a broken handle wholesale; a handle is
/// never repaired in place.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement with Postgres-style `$1` placeholders.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult>;

    /// Tear the handle down. A failure here is reported so the caller can
    /// log it, but the handle is abandoned either way.
    async fn close(&self) -> Result<()>;
}

/// Opens logical connections from stored connection parameters.
///
/// The reconnecting driver calls this once during `init` and once per
/// recovery attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Connection>>;
}
