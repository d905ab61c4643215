use serde_json::Value;

use crate::core::connection::ConnectionManager;
use crate::core::no_rows::ResponseCode;
use crate::core::runner::StatementRunner;
use crate::core::types::{DbRow, ExecutionOutcome, Params};
use crate::error::{ShortCircuit, TableResult};

/// Request-scoped facade: bound parameters plus a runner over one connection.
pub struct SqlTable<'c> {
    conn: &'c mut ConnectionManager,
    runner: StatementRunner,
    params: Params,
}

impl<'c> SqlTable<'c> {
    pub fn new(conn: &'c mut ConnectionManager) -> Self {
        Self {
            conn,
            runner: StatementRunner::new(),
            params: Params::new(),
        }
    }

    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.params.set(name, value);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn clear_params(&mut self) -> &mut Self {
        self.params.clear();
        self
    }

    pub fn enable_auto_response(
        &mut self,
        code: ResponseCode,
        message: Option<&str>,
        one_shot: bool,
    ) -> &mut Self {
        self.runner.enable_auto_response(code, message, one_shot);
        self
    }

    pub fn set_single_row_return(&mut self, enabled: bool, one_shot: bool) -> &mut Self {
        self.runner.set_single_row_return(enabled, one_shot);
        self
    }

    pub fn set_suppress_data_capture(&mut self, enabled: bool, one_shot: bool) -> &mut Self {
        self.runner.set_suppress_data_capture(enabled, one_shot);
        self
    }

    pub fn runner_mut(&mut self) -> &mut StatementRunner {
        &mut self.runner
    }

    /// Prepares `sql`, binds the current parameters and executes it.
    pub fn query(&mut self, sql: &str) -> Result<&ExecutionOutcome, ShortCircuit> {
        self.runner.set_echo_errors(self.conn.debug());
        let mut stmt = match self.conn.prepare(sql) {
            Ok(stmt) => stmt,
            Err(e) => {
                tracing::error!(sql, "prepare failed");
                return Err(self.runner.record_failure(e.into_db_error()));
            }
        };
        self.runner.execute(stmt.as_mut(), &self.params)
    }

    /// Marks the last outcome failed and rolls back an open transaction.
    pub fn execution_failure(&mut self) -> TableResult<()> {
        self.runner.mark_failed();
        self.conn.roll_back()
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        self.runner.outcome()
    }

    pub fn was_success(&self) -> bool {
        self.runner.outcome().was_success
    }

    pub fn row_count(&self) -> u64 {
        self.runner.outcome().row_count
    }

    pub fn first_row(&self) -> Option<&DbRow> {
        self.runner.outcome().first_row()
    }

    pub fn all_rows(&self) -> &[DbRow] {
        self.runner.outcome().all_rows()
    }

    pub fn last_insert_id(&self) -> TableResult<String> {
        self.conn.last_insert_id(None)
    }

    pub fn connection(&mut self) -> &mut ConnectionManager {
        self.conn
    }
}
