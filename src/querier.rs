use std::sync::Arc;

use crate::error::{PgBindError, Result};
use crate::params::{to_positional, ParamBag};
use crate::schema::Record;
use crate::traits::DatabaseDriver;
use crate::types::{FromRow, FromSqlValue, RawQueryResult, Row, SqlValue};

/// Query surface over a driver.
///
/// Statements are SQL templates with `:name` placeholders; each method
/// rewrites the template to positional form, executes it, and maps the
/// result. The `description` argument is a short label for logs and error
/// diagnostics, not SQL.
#[derive(Clone)]
pub struct Querier {
    driver: Arc<dyn DatabaseDriver>,
}

impl Querier {
    pub(crate) fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { driver }
    }

    /// Execute a template and return the raw result set.
    pub async fn query(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
    ) -> Result<RawQueryResult> {
        let (sql, args) = to_positional(sql, bag);
        self.driver.execute(description, &sql, &args).await
    }

    /// First column of the first row, or `default` when the result set is
    /// empty.
    ///
    /// A NULL first value also yields the default; the zero-row case and a
    /// present-but-NULL value are indistinguishable here. Use
    /// `field_or_fail` when that distinction must fail loudly.
    pub async fn field<T: FromSqlValue>(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
        default: T,
    ) -> Result<T> {
        let result = self.query(description, sql, bag).await?;
        match result.first_value() {
            None | Some(SqlValue::Null) => Ok(default),
            Some(value) => T::from_sql_value(value).ok_or_else(|| PgBindError::TypeMismatch {
                column: result.columns.first().cloned().unwrap_or_default(),
                expected: T::EXPECTED,
            }),
        }
    }

    /// Like `field`, but zero rows (or a NULL value) raises `NotFound`.
    pub async fn field_or_fail<T: FromSqlValue>(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
    ) -> Result<T> {
        let result = self.query(description, sql, bag).await?;
        match result.first_value() {
            None | Some(SqlValue::Null) => Err(PgBindError::NotFound(description.to_string())),
            Some(value) => T::from_sql_value(value).ok_or_else(|| PgBindError::TypeMismatch {
                column: result.columns.first().cloned().unwrap_or_default(),
                expected: T::EXPECTED,
            }),
        }
    }

    /// First row mapped into `R`, or `None` when the result set is empty.
    pub async fn row<R: FromRow>(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
    ) -> Result<Option<R>> {
        self.row_with(description, sql, bag, R::from_row).await
    }

    /// Like `row`, but with an explicit per-row conversion hook.
    pub async fn row_with<R, F>(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
        convert: F,
    ) -> Result<Option<R>>
    where
        F: Fn(&Row) -> Result<R> + Send,
    {
        let result = self.query(description, sql, bag).await?;
        let mut rows = result.into_rows();
        if rows.is_empty() {
            return Ok(None);
        }
        let row = rows.swap_remove(0);
        convert(&row).map(Some)
    }

    /// Like `row`, but zero rows raises `NotFound`.
    pub async fn row_or_fail<R: FromRow>(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
    ) -> Result<R> {
        self.row(description, sql, bag)
            .await?
            .ok_or_else(|| PgBindError::NotFound(description.to_string()))
    }

    /// All rows mapped into `R`.
    pub async fn rows<R: FromRow>(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
    ) -> Result<Vec<R>> {
        self.rows_with(description, sql, bag, R::from_row).await
    }

    /// Like `rows`, but with an explicit per-row conversion hook.
    pub async fn rows_with<R, F>(
        &self,
        description: &str,
        sql: &str,
        bag: &ParamBag,
        convert: F,
    ) -> Result<Vec<R>>
    where
        F: Fn(&Row) -> Result<R> + Send,
    {
        let result = self.query(description, sql, bag).await?;
        let rows = result.into_rows();
        rows.iter().map(convert).collect()
    }

    /// Execute a statement and return the affected-row count.
    pub async fn execute(&self, description: &str, sql: &str, bag: &ParamBag) -> Result<u64> {
        let result = self.query(description, sql, bag).await?;
        Ok(result.rows_affected)
    }

    /// Execute an UPDATE. Same path as `execute`, named for call sites.
    pub async fn update(&self, description: &str, sql: &str, bag: &ParamBag) -> Result<u64> {
        self.execute(description, sql, bag).await
    }

    /// Execute a DELETE. This layer does not distinguish deletes from
    /// updates; both return the affected-row count.
    pub async fn delete(&self, description: &str, sql: &str, bag: &ParamBag) -> Result<u64> {
        self.update(description, sql, bag).await
    }

    /// Insert a record and write the generated key back into it.
    ///
    /// Columns follow the record's field declaration order, minus the
    /// primary-key field. On success the record's key is the generated id;
    /// on any failure the record is left unmodified.
    pub async fn insert_object<R: Record>(&self, record: &mut R) -> Result<()> {
        let schema = R::schema();
        let values = record.values();

        let mut sql = String::with_capacity(128);
        sql.push_str("INSERT INTO ");
        sql.push_str(schema.table);
        sql.push_str(" (");
        let mut first = true;
        for (name, _) in values.iter().filter(|(n, _)| *n != schema.primary_key) {
            if !first {
                sql.push_str(", ");
            }
            first = false;
            sql.push_str(name);
        }
        sql.push_str(") VALUES (");
        let mut first = true;
        for (name, _) in values.iter().filter(|(n, _)| *n != schema.primary_key) {
            if !first {
                sql.push_str(", ");
            }
            first = false;
            sql.push(':');
            sql.push_str(name);
        }
        sql.push_str(") RETURNING ");
        sql.push_str(schema.primary_key);

        let mut bag = ParamBag::new();
        for (name, value) in values {
            if name != schema.primary_key {
                bag = bag.bind(name, value);
            }
        }

        let description = format!("insert into {}", schema.table);
        let result = self.query(&description, &sql, &bag).await?;

        match result.first_value().and_then(i64::from_sql_value) {
            Some(id) if id > 0 => {
                record.set_generated_id(id);
                Ok(())
            }
            _ => Err(PgBindError::MissingGeneratedId {
                table: schema.table.to_string(),
            }),
        }
    }

    /// Update a record's row, matched by primary key.
    ///
    /// A record whose only field is the primary key is a no-op: no
    /// statement is executed and 0 is returned.
    pub async fn update_object<R: Record>(
        &self,
        primary_key: impl Into<SqlValue> + Send,
        record: &R,
    ) -> Result<u64> {
        let schema = R::schema();
        let values: Vec<_> = record
            .values()
            .into_iter()
            .filter(|(name, _)| *name != schema.primary_key)
            .collect();
        if values.is_empty() {
            log::trace!("no updates to {}", schema.table);
            return Ok(0);
        }

        let mut sql = String::with_capacity(128);
        sql.push_str("UPDATE ");
        sql.push_str(schema.table);
        sql.push_str(" SET ");
        for (i, (name, _)) in values.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(name);
            sql.push_str(" = :");
            sql.push_str(name);
        }
        sql.push_str(" WHERE ");
        sql.push_str(schema.primary_key);
        sql.push_str(" = :");
        sql.push_str(schema.primary_key);

        let mut bag = ParamBag::new();
        for (name, value) in values {
            bag = bag.bind(name, value);
        }
        bag = bag.bind(schema.primary_key, primary_key);

        let description = format!("update {}", schema.table);
        self.update(&description, &sql, &bag).await
    }
}
