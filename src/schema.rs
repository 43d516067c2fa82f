use crate::types::SqlValue;

/// Static table binding for a record type: the table it maps to and which
/// column holds the generated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub primary_key: &'static str,
}

impl TableSchema {
    pub const fn new(table: &'static str, primary_key: &'static str) -> Self {
        Self { table, primary_key }
    }
}

/// A record mapped to a table row.
///
/// `values` enumerates fields in declaration order; that order determines
/// the column order of generated INSERT/UPDATE statements. The primary-key
/// field is listed like any other — the CRUD methods exclude it by name.
pub trait Record {
    fn schema() -> TableSchema;

    /// Field name and current value for every field, in declaration order.
    fn values(&self) -> Vec<(&'static str, SqlValue)>;

    /// Called by `insert_object` with the database-generated key.
    fn set_generated_id(&mut self, id: i64);
}
