use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::{ConnectionOptions, ConnectionParams};
use crate::error::{PgBindError, Result};
use crate::traits::{Connection, Connector, DatabaseDriver};
use crate::types::{RawQueryResult, SqlValue};

/// Driver that owns a single logical connection and heals it in place.
///
/// On an execution failure the broken connection is closed, a new one is
/// opened from the stored parameters, and the statement is retried exactly
/// once. Transient drops (idle timeout, server restart) self-heal on that
/// retry; persistent failures surface to the caller after it.
///
/// The mutex serializes the whole execute/reconnect sequence: one in-flight
/// statement per driver instance. Separate instances are fully independent.
pub struct ReconnectingDriver {
    connector: Box<dyn Connector>,
    params: ConnectionParams,
    options: ConnectionOptions,
    connection: Mutex<Option<Box<dyn Connection>>>,
    cancellation: CancellationToken,
}

impl ReconnectingDriver {
    /// Creates the driver without connecting. `init` opens the first
    /// logical connection; query methods before that fail with
    /// `NotConnected`.
    pub fn new(
        connector: Box<dyn Connector>,
        params: ConnectionParams,
        options: ConnectionOptions,
    ) -> Self {
        Self {
            connector,
            params,
            options,
            connection: Mutex::new(None),
            cancellation: CancellationToken::new(),
        }
    }

    /// Opens the first logical connection. Must be called exactly once; a
    /// second call against a live connection is rejected rather than
    /// silently replacing it.
    pub async fn init(&self) -> Result<()> {
        let mut guard = self.connection.lock().await;
        if guard.is_some() {
            return Err(PgBindError::AlreadyConnected);
        }
        let connection = self.connector.connect(&self.params).await?;
        log::debug!(
            "connected to {}/{} as {}",
            self.params.host,
            self.params.database,
            self.params.user
        );
        *guard = Some(connection);
        Ok(())
    }

    /// Token observed after each network attempt. Cancelling it makes
    /// pending calls return `Cancelled` instead of processing a late
    /// result; it does not abort the in-flight network operation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    async fn attempt(
        &self,
        connection: &dyn Connection,
        description: &str,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<RawQueryResult> {
        let result = match self.options.statement_timeout {
            Some(limit) => match tokio::time::timeout(limit, connection.execute(sql, params)).await
            {
                Ok(result) => result,
                Err(_) => Err(PgBindError::Timeout(description.to_string())),
            },
            None => connection.execute(sql, params).await,
        };
        if self.cancellation.is_cancelled() {
            return Err(PgBindError::Cancelled);
        }
        result
    }

    fn surface(
        &self,
        error: PgBindError,
        description: &str,
        sql: &str,
        params: &[SqlValue],
    ) -> PgBindError {
        match error {
            PgBindError::QueryFailed { code, message } => PgBindError::ExecutionFailed {
                description: description.to_string(),
                sql: sql.to_string(),
                params: params.to_vec(),
                code,
                message,
            },
            other => other,
        }
    }
}

#[async_trait]
impl DatabaseDriver for ReconnectingDriver {
    async fn execute(
        &self,
        description: &str,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<RawQueryResult> {
        let mut guard = self.connection.lock().await;
        let connection = guard.as_deref().ok_or(PgBindError::NotConnected)?;

        let error = match self.attempt(connection, description, sql, params).await {
            Ok(result) => return Ok(result),
            Err(error @ PgBindError::Cancelled) => return Err(error),
            Err(error) => error,
        };

        log::error!(
            "statement failed ({description}): code={:?} {error}",
            error.driver_code()
        );

        // The handle is presumed broken. Close it, then rebuild from the
        // stored parameters. A close failure does not abort recovery.
        if let Some(broken) = guard.take() {
            if let Err(close_error) = broken.close().await {
                log::error!("failed to close broken connection ({description}): {close_error}");
            }
        }

        let fresh = match self.connector.connect(&self.params).await {
            Ok(connection) => connection,
            Err(connect_error) => {
                log::error!("reconnect failed ({description}): {connect_error}");
                return Err(PgBindError::ReconnectFailed {
                    description: description.to_string(),
                    message: connect_error.to_string(),
                });
            }
        };
        log::debug!(
            "reconnected to {}/{} ({description})",
            self.params.host,
            self.params.database
        );
        let connection = guard.insert(fresh);

        match self
            .attempt(connection.as_ref(), description, sql, params)
            .await
        {
            Ok(result) => Ok(result),
            Err(error @ PgBindError::Cancelled) => Err(error),
            Err(retry_error) => {
                log::error!(
                    "retry failed ({description}): sql={sql} params={params:?} {retry_error}"
                );
                Err(self.surface(retry_error, description, sql, params))
            }
        }
    }
}
