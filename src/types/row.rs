use crate::error::{PgBindError, Result};
use crate::types::{FromSqlValue, SqlValue};

/// Driver-agnostic raw result from a statement execution.
#[derive(Debug, Clone)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<SqlValue>>,
    /// Rows affected by an INSERT/UPDATE/DELETE
    pub rows_affected: u64,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>, rows_affected: u64) -> Self {
        Self {
            columns,
            rows,
            rows_affected,
        }
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected: 0,
        }
    }

    /// Converts the raw rows into name-keyed `Row` values.
    pub fn into_rows(self) -> Vec<Row> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| Row::new(&columns, values))
            .collect()
    }

    /// First column of the first row, if any.
    pub fn first_value(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// A single result row. Values keep the column order the driver returned.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<(String, SqlValue)>,
}

impl Row {
    pub(crate) fn new(columns: &[String], values: Vec<SqlValue>) -> Self {
        let values = columns
            .iter()
            .cloned()
            .zip(values.into_iter())
            .collect();
        Self { values }
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Result<&SqlValue> {
        self.try_get(column)
            .ok_or_else(|| PgBindError::ColumnNotFound(column.to_string()))
    }

    pub fn try_get(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Gets a value by column name, converted to `T`.
    pub fn get_as<T: FromSqlValue>(&self, column: &str) -> Result<T> {
        let value = self.get(column)?;
        T::from_sql_value(value).ok_or_else(|| PgBindError::TypeMismatch {
            column: column.to_string(),
            expected: T::EXPECTED,
        })
    }

    /// First value in column order, if the row has any columns.
    pub fn first(&self) -> Option<&SqlValue> {
        self.values.first().map(|(_, value)| value)
    }

    /// Returns all column names in this row, in order.
    pub fn columns(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Structural conversion from a result row into an application record.
///
/// Implementations read columns by name with `get`/`get_as`; coercions
/// beyond the widening rules of `FromSqlValue` belong in a `row_with`/
/// `rows_with` conversion hook instead.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}
