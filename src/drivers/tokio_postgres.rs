use async_trait::async_trait;
use futures::StreamExt;
use tokio::pin;
use tokio::task::JoinHandle;
use tokio_postgres::{types::ToSql, Client, NoTls};

use crate::config::ConnectionParams;
use crate::error::{PgBindError, Result};
use crate::traits::{Connection, Connector};
use crate::types::{RawQueryResult, SqlValue};

/// Opens PostgreSQL connections with tokio-postgres.
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Connection>> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&params.host)
            .dbname(&params.database)
            .user(&params.user)
            .password(&params.password);

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| PgBindError::ConnectionFailed(e.to_string()))?;

        // The connection object drives the socket; it runs until the client
        // drops or the handle is aborted.
        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("postgres connection task ended: {e}");
            }
        });

        Ok(Box::new(PgConnection { client, handle }))
    }
}

/// A live tokio-postgres connection.
pub struct PgConnection {
    client: Client,
    handle: JoinHandle<()>,
}

#[async_trait]
impl Connection for PgConnection {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        let converted: Vec<Box<dyn ToSql + Sync + Send>> = params
            .iter()
            .map(sql_value_to_tosql)
            .collect::<Result<_>>()?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = converted
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let stream = self
            .client
            .query_raw(sql, param_refs)
            .await
            .map_err(query_error)?;
        pin!(stream);

        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<SqlValue>> = Vec::new();
        while let Some(row) = stream.next().await {
            let row = row.map_err(query_error)?;
            if columns.is_empty() {
                columns = row
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
            }
            rows.push((0..row.len()).map(|i| row_value(&row, i)).collect());
        }

        let rows_affected = stream.rows_affected().unwrap_or(rows.len() as u64);
        Ok(RawQueryResult::new(columns, rows, rows_affected))
    }

    async fn close(&self) -> Result<()> {
        self.handle.abort();
        Ok(())
    }
}

fn query_error(error: tokio_postgres::Error) -> PgBindError {
    PgBindError::QueryFailed {
        code: error.code().map(|c| c.code().to_string()),
        message: error.to_string(),
    }
}

/// Convert a SqlValue to a boxed ToSql trait object.
fn sql_value_to_tosql(value: &SqlValue) -> Result<Box<dyn ToSql + Sync + Send>> {
    Ok(match value {
        SqlValue::Null => Box::new(None::<String>),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Int32(i) => Box::new(*i),
        SqlValue::Int64(i) => Box::new(*i),
        SqlValue::UInt64(i) => Box::new(i64::try_from(*i).map_err(|_| {
            PgBindError::QueryFailed {
                code: None,
                message: format!("u64 parameter {i} out of range for bigint"),
            }
        })?),
        SqlValue::Float(f) => Box::new(*f),
        SqlValue::Bool(b) => Box::new(*b),
    })
}

/// Convert a row value at a given index to a SqlValue.
/// Covers the types this layer binds; anything else reads as NULL.
fn row_value(row: &tokio_postgres::Row, index: usize) -> SqlValue {
    if let Ok(value) = row.try_get::<_, Option<i32>>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Int32);
    }
    if let Ok(value) = row.try_get::<_, Option<i64>>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Int64);
    }
    if let Ok(value) = row.try_get::<_, Option<String>>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Text);
    }
    if let Ok(value) = row.try_get::<_, Option<bool>>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Bool);
    }
    if let Ok(value) = row.try_get::<_, Option<f64>>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Float);
    }
    SqlValue::Null
}
