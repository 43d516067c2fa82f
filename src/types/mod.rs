mod row;
mod sql_value;

pub use row::{FromRow, RawQueryResult, Row};
pub use sql_value::{FromSqlValue, SqlValue};
