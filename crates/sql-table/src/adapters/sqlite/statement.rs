use std::collections::VecDeque;

use rusqlite::{
    types::{Value as SqlValue, ValueRef},
    Row, Statement,
};
use serde_json::Value;

use crate::{
    core::client::DbStatement,
    core::types::{ColumnMeta, Params, RawRow},
    error::DbError,
};

/// Prepared rusqlite statement speaking the string-valued driver protocol.
///
/// Queries are drained on `execute` so `row_count` can report returned rows.
/// Schema statements report 0 rows; `sqlite3_changes` is not reset by DDL.
pub struct SqliteStatement<'conn> {
    stmt: Statement<'conn>,
    sql: String,
    columns: Vec<ColumnMeta>,
    buffered: VecDeque<RawRow>,
    row_count: u64,
}

impl<'conn> SqliteStatement<'conn> {
    pub fn new(stmt: Statement<'conn>, sql: &str) -> Self {
        let columns = stmt
            .columns()
            .iter()
            .map(|col| ColumnMeta {
                name: col.name().to_string(),
                native_type: col.decl_type().and_then(native_type_for),
            })
            .collect();
        Self {
            stmt,
            sql: sql.to_string(),
            columns,
            buffered: VecDeque::new(),
            row_count: 0,
        }
    }

    fn bind(&mut self, params: &Params) -> Result<(), DbError> {
        for index in 1..=self.stmt.parameter_count() {
            let name = self.stmt.parameter_name(index).map(str::to_owned);
            let value = name
                .as_deref()
                .and_then(|n| params.get(n))
                .map(to_sql_value)
                .unwrap_or(SqlValue::Null);
            self.stmt.raw_bind_parameter(index, value)?;
        }
        Ok(())
    }
}

impl DbStatement for SqliteStatement<'_> {
    fn execute(&mut self, params: &Params) -> Result<bool, DbError> {
        self.buffered.clear();
        self.row_count = 0;
        self.bind(params)?;

        if self.columns.is_empty() {
            let changes = self.stmt.raw_execute()?;
            self.row_count = if is_schema_statement(&self.sql) { 0 } else { changes as u64 };
            return Ok(true);
        }

        let mut rows = self.stmt.raw_query();
        while let Some(row) = rows.next()? {
            self.buffered.push_back(raw_row(row, &self.columns)?);
        }
        self.row_count = self.buffered.len() as u64;
        Ok(true)
    }

    fn sql(&self) -> &str {
        &self.sql
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_meta(&self, index: usize) -> Option<ColumnMeta> {
        self.columns.get(index).cloned()
    }

    fn fetch_row(&mut self) -> Result<Option<RawRow>, DbError> {
        Ok(self.buffered.pop_front())
    }
}

/// Maps a declared SQLite type onto a driver native-type tag.
///
/// `decimal(10, 2)` becomes `DECIMAL`, `double precision` becomes
/// `DOUBLE_PRECISION`. Empty declarations yield `None`.
pub fn native_type_for(decl_type: &str) -> Option<String> {
    let base = decl_type.split('(').next().unwrap_or_default().trim();
    if base.is_empty() {
        return None;
    }
    Some(
        base.split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_uppercase(),
    )
}

fn is_schema_statement(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    ["CREATE", "DROP", "ALTER"]
        .iter()
        .any(|k| k.eq_ignore_ascii_case(keyword))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn raw_row(row: &Row<'_>, columns: &[ColumnMeta]) -> Result<RawRow, DbError> {
    let mut out = Vec::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        let v = match row.get_ref(i)? {
            ValueRef::Null => None,
            ValueRef::Integer(x) => Some(x.to_string()),
            ValueRef::Real(x) => Some(x.to_string()),
            ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
        };
        out.push((col.name.clone(), v));
    }
    Ok(out)
}
