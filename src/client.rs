use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{ConnectionOptions, ConnectionParams};
use crate::drivers::{PgConnector, ReconnectingDriver};
use crate::error::{PgBindError, Result};
use crate::params::ParamBag;
use crate::querier::Querier;
use crate::traits::DatabaseDriver;

/// Main entry point for pgbind.
/// Owns the single logical connection and hands out queriers over it.
pub struct PgBindClient {
    driver: Arc<dyn DatabaseDriver>,
    cancellation: CancellationToken,
    transaction_active: AtomicBool,
}

impl PgBindClient {
    /// Connect to a PostgreSQL database with the given parameters.
    ///
    /// # Example
    /// ```ignore
    /// let params = ConnectionParams::new("localhost", "mydb", "app", "secret");
    /// let client = PgBindClient::connect(params, ConnectionOptions::default()).await?;
    /// ```
    pub async fn connect(params: ConnectionParams, options: ConnectionOptions) -> Result<Self> {
        let driver = ReconnectingDriver::new(Box::new(PgConnector), params, options);
        driver.init().await?;
        let cancellation = driver.cancellation_token();
        Ok(Self {
            driver: Arc::new(driver),
            cancellation,
            transaction_active: AtomicBool::new(false),
        })
    }

    /// Create a client with a custom driver.
    /// Useful for testing or alternative execution backends.
    pub fn with_driver(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self {
            driver,
            cancellation: CancellationToken::new(),
            transaction_active: AtomicBool::new(false),
        }
    }

    /// Create a Querier for executing statements.
    pub fn querier(&self) -> Querier {
        Querier::new(Arc::clone(&self.driver))
    }

    /// Token that makes pending calls drop late results instead of
    /// processing them. Cancelling does not abort in-flight network
    /// operations.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run `work` inside a transaction on this client's connection.
    ///
    /// Commits when the callback returns `Ok`; rolls back and re-raises the
    /// callback's error otherwise. A rollback failure is logged, but the
    /// callback's error is what the caller sees. Nested transactions are
    /// rejected with `TransactionAlreadyActive`.
    pub async fn transaction<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnOnce(Querier) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.transaction_active.swap(true, Ordering::SeqCst) {
            return Err(PgBindError::TransactionAlreadyActive);
        }
        let _guard = ActiveFlag(&self.transaction_active);

        let querier = self.querier();
        querier
            .execute("begin transaction", "BEGIN", &ParamBag::new())
            .await?;

        match work(self.querier()).await {
            Ok(value) => {
                querier
                    .execute("commit transaction", "COMMIT", &ParamBag::new())
                    .await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = querier
                    .execute("rollback transaction", "ROLLBACK", &ParamBag::new())
                    .await
                {
                    log::error!("rollback failed after transaction error: {rollback_error}");
                }
                Err(error)
            }
        }
    }
}

/// Clears the transaction flag on every exit path.
struct ActiveFlag<'a>(&'a AtomicBool);

impl Drop for ActiveFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::InMemoryTestDriver;
    use crate::types::SqlValue;

    fn recorded_sql(driver: &InMemoryTestDriver) -> Vec<String> {
        driver
            .recorded_statements()
            .into_iter()
            .map(|s| s.sql)
            .collect()
    }

    #[tokio::test]
    async fn test_transaction_commits_on_success() {
        let driver = Arc::new(InMemoryTestDriver::new());
        let client = PgBindClient::with_driver(Arc::clone(&driver) as Arc<dyn DatabaseDriver>);

        let value = client
            .transaction(|querier| async move {
                querier
                    .execute(
                        "touch row",
                        "UPDATE t SET v = :v",
                        &ParamBag::new().bind("v", 1i64),
                    )
                    .await?;
                Ok(5i64)
            })
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert_eq!(
            recorded_sql(&driver),
            vec!["BEGIN", "UPDATE t SET v = $1", "COMMIT"]
        );
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_and_surfaces_original_error() {
        let driver = Arc::new(InMemoryTestDriver::new());
        let client = PgBindClient::with_driver(Arc::clone(&driver) as Arc<dyn DatabaseDriver>);

        let err = client
            .transaction::<(), _, _>(|querier| async move {
                querier
                    .execute(
                        "touch row",
                        "UPDATE t SET v = :v",
                        &ParamBag::new().bind("v", SqlValue::Int64(1)),
                    )
                    .await?;
                Err(PgBindError::NotFound("poof".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PgBindError::NotFound(_)));
        assert_eq!(
            recorded_sql(&driver),
            vec!["BEGIN", "UPDATE t SET v = $1", "ROLLBACK"]
        );
    }

    #[tokio::test]
    async fn test_nested_transaction_rejected() {
        let driver = Arc::new(InMemoryTestDriver::new());
        let client = PgBindClient::with_driver(Arc::clone(&driver) as Arc<dyn DatabaseDriver>);

        let err = client
            .transaction::<(), _, _>(|_querier| async {
                client
                    .transaction::<(), _, _>(|_inner| async { Ok(()) })
                    .await
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PgBindError::TransactionAlreadyActive));
        // The outer transaction still rolls back.
        assert_eq!(recorded_sql(&driver), vec!["BEGIN", "ROLLBACK"]);
    }

    #[tokio::test]
    async fn test_transaction_flag_clears_after_rollback() {
        let driver = Arc::new(InMemoryTestDriver::new());
        let client = PgBindClient::with_driver(Arc::clone(&driver) as Arc<dyn DatabaseDriver>);

        let _ = client
            .transaction::<(), _, _>(|_querier| async {
                Err(PgBindError::NotFound("first".to_string()))
            })
            .await;

        // A new transaction is allowed once the first one unwound.
        client
            .transaction(|_querier| async { Ok(()) })
            .await
            .unwrap();
    }
}
