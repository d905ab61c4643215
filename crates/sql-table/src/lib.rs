//! Statement execution over a relational client.
//!
//! Rows come back with numeric columns cast from the driver's strings using
//! column metadata, and a statement that touches no rows can end the request
//! with a configured HTTP status.

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use crate::adapters::http::{BufferedEmitter, HttpResponse, ResponseEmitter};
pub use crate::adapters::request::RequestInput;
pub use crate::adapters::sqlite::SqliteClient;
pub use crate::config::DbConfig;
pub use crate::core::caster::{cast_values, TypeClass};
pub use crate::core::client::{Connect, DbClient, DbStatement};
pub use crate::core::connection::ConnectionManager;
pub use crate::core::no_rows::{NoRowsPolicy, NoRowsRule, ResponseCode};
pub use crate::core::runner::StatementRunner;
pub use crate::core::table::SqlTable;
pub use crate::core::types::{ColumnMeta, Data, DbRow, ExecutionOutcome, Params, RawRow};
pub use crate::error::{DbError, ShortCircuit, TableError, TableResult};
