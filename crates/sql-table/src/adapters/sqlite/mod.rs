mod statement;

use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::{
    config::DbConfig,
    core::client::{Connect, DbClient, DbStatement},
    error::DbError,
};

pub use statement::{native_type_for, SqliteStatement};

/// [`DbClient`] over a single rusqlite connection.
pub struct SqliteClient {
    conn: Connection,
}

impl SqliteClient {
    pub fn open(path: &str, busy_timeout_ms: u64) -> Result<Self, DbError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        let _ = conn.busy_timeout(Duration::from_millis(busy_timeout_ms));
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Connect for SqliteClient {
    /// `database` is the file path; host and credentials do not apply.
    fn connect(config: &DbConfig) -> Result<Self, DbError> {
        Self::open(&config.database, 2_000)
    }
}

impl DbClient for SqliteClient {
    fn prepare<'a>(&'a self, sql: &str) -> Result<Box<dyn DbStatement + 'a>, DbError> {
        let stmt = self.conn.prepare(sql)?;
        Ok(Box::new(SqliteStatement::new(stmt, sql)))
    }

    fn begin_transaction(&self) -> Result<(), DbError> {
        Ok(self.conn.execute_batch("BEGIN")?)
    }

    fn commit(&self) -> Result<(), DbError> {
        Ok(self.conn.execute_batch("COMMIT")?)
    }

    fn roll_back(&self) -> Result<(), DbError> {
        Ok(self.conn.execute_batch("ROLLBACK")?)
    }

    /// SQLite has no named sequences; `name` is ignored.
    fn last_insert_id(&self, _name: Option<&str>) -> Result<String, DbError> {
        Ok(self.conn.last_insert_rowid().to_string())
    }
}
