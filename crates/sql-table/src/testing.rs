//! Scripted driver doubles for exercising paths a real driver rarely takes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::core::client::{DbClient, DbStatement};
use crate::core::types::{ColumnMeta, Params, RawRow};
use crate::error::DbError;

#[derive(Debug, Clone)]
pub struct ScriptedStatement {
    sql: String,
    columns: Vec<ColumnMeta>,
    rows: VecDeque<RawRow>,
    result: Result<bool, DbError>,
    affected: Option<u64>,
    fetch_calls: usize,
    executed_with: Option<Params>,
}

impl ScriptedStatement {
    pub fn select(columns: &[(&str, Option<&str>)], rows: Vec<Vec<Option<&str>>>) -> Self {
        let columns: Vec<ColumnMeta> = columns
            .iter()
            .map(|(name, native)| ColumnMeta::new(*name, *native))
            .collect();
        let rows: VecDeque<RawRow> = rows
            .into_iter()
            .map(|values| {
                columns
                    .iter()
                    .zip(values)
                    .map(|(c, v)| (c.name.clone(), v.map(str::to_owned)))
                    .collect::<RawRow>()
            })
            .collect();
        Self {
            sql: String::new(),
            columns,
            rows,
            result: Ok(true),
            affected: None,
            fetch_calls: 0,
            executed_with: None,
        }
    }

    pub fn dml(affected: u64) -> Self {
        Self {
            affected: Some(affected),
            ..Self::select(&[], vec![])
        }
    }

    pub fn with_sql(mut self, sql: &str) -> Self {
        self.sql = sql.to_string();
        self
    }

    /// `execute` raises `e`.
    pub fn failing(mut self, e: DbError) -> Self {
        self.result = Err(e);
        self
    }

    /// `execute` returns `Ok(false)`.
    pub fn reporting_failure(mut self) -> Self {
        self.result = Ok(false);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls
    }

    pub fn executed_with(&self) -> Option<&Params> {
        self.executed_with.as_ref()
    }
}

impl DbStatement for ScriptedStatement {
    fn execute(&mut self, params: &Params) -> Result<bool, DbError> {
        self.executed_with = Some(params.clone());
        self.result.clone()
    }

    fn sql(&self) -> &str {
        &self.sql
    }

    fn row_count(&self) -> u64 {
        self.affected.unwrap_or(self.rows.len() as u64)
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_meta(&self, index: usize) -> Option<ColumnMeta> {
        self.columns.get(index).cloned()
    }

    fn fetch_row(&mut self) -> Result<Option<RawRow>, DbError> {
        self.fetch_calls += 1;
        Ok(self.rows.pop_front())
    }
}

/// Hands out queued statements and records transaction calls.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    statements: RefCell<VecDeque<ScriptedStatement>>,
    calls: Rc<RefCell<Vec<String>>>,
    fail_transactions: bool,
    last_insert_id: String,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(self, stmt: ScriptedStatement) -> Self {
        self.statements.borrow_mut().push_back(stmt);
        self
    }

    pub fn with_last_insert_id(mut self, id: &str) -> Self {
        self.last_insert_id = id.to_string();
        self
    }

    pub fn failing_transactions(mut self) -> Self {
        self.fail_transactions = true;
        self
    }

    /// Shared log of calls, still readable after the client is boxed away.
    pub fn call_log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.calls)
    }

    fn record(&self, call: &str) -> Result<(), DbError> {
        self.calls.borrow_mut().push(call.to_string());
        if self.fail_transactions {
            return Err(DbError::new(format!("{call} refused")).with_sql_state("25000"));
        }
        Ok(())
    }
}

impl DbClient for ScriptedClient {
    fn prepare<'a>(&'a self, sql: &str) -> Result<Box<dyn DbStatement + 'a>, DbError> {
        self.calls.borrow_mut().push(format!("prepare {sql}"));
        match self.statements.borrow_mut().pop_front() {
            Some(stmt) => Ok(Box::new(stmt.with_sql(sql))),
            None => Err(DbError::new(format!("no scripted statement for: {sql}")).with_sql_state("42000")),
        }
    }

    fn begin_transaction(&self) -> Result<(), DbError> {
        self.record("begin")
    }

    fn commit(&self) -> Result<(), DbError> {
        self.record("commit")
    }

    fn roll_back(&self) -> Result<(), DbError> {
        self.record("rollback")
    }

    fn last_insert_id(&self, name: Option<&str>) -> Result<String, DbError> {
        self.calls
            .borrow_mut()
            .push(format!("last_insert_id {}", name.unwrap_or("")));
        Ok(self.last_insert_id.clone())
    }
}
