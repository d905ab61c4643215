use crate::config::DbConfig;
use crate::core::types::{ColumnMeta, Params, RawRow};
use crate::error::DbError;

/// A prepared statement as the database driver exposes it.
pub trait DbStatement {
    /// `Ok(false)` is a failure the driver reported without raising.
    fn execute(&mut self, params: &Params) -> Result<bool, DbError>;

    /// SQL text the statement was prepared from.
    fn sql(&self) -> &str;

    /// Affected rows for DML, returned rows for queries.
    fn row_count(&self) -> u64;

    fn column_count(&self) -> usize;

    fn column_meta(&self, index: usize) -> Option<ColumnMeta>;

    /// Next row of the result set, `None` once exhausted.
    fn fetch_row(&mut self) -> Result<Option<RawRow>, DbError>;
}

/// An open driver connection.
pub trait DbClient {
    fn prepare<'a>(&'a self, sql: &str) -> Result<Box<dyn DbStatement + 'a>, DbError>;

    fn begin_transaction(&self) -> Result<(), DbError>;

    fn commit(&self) -> Result<(), DbError>;

    fn roll_back(&self) -> Result<(), DbError>;

    fn last_insert_id(&self, name: Option<&str>) -> Result<String, DbError>;
}

/// Drivers that can be opened from connection settings.
pub trait Connect: DbClient + Sized + 'static {
    fn connect(config: &DbConfig) -> Result<Self, DbError>;
}
