use serde_json::{json, Value};

use crate::adapters::http::HttpResponse;
use crate::core::caster::cast_values;
use crate::core::client::DbStatement;
use crate::core::no_rows::{NoRowsPolicy, ResponseCode};
use crate::core::types::{Data, ExecutionOutcome, Params};
use crate::error::{DbError, ShortCircuit};

#[derive(Debug, Clone, Copy, Default)]
struct Toggle {
    enabled: bool,
    one_shot: bool,
}

impl Toggle {
    fn set(&mut self, enabled: bool, one_shot: bool) {
        self.enabled = enabled;
        self.one_shot = enabled && one_shot;
    }

    fn reset_one_shot(&mut self) {
        if self.one_shot {
            *self = Toggle::default();
        }
    }
}

/// Executes prepared statements and shapes their outcome.
///
/// A zero-row result may end the request through the [`NoRowsPolicy`];
/// driver failures end it with a 500. Both come back as [`ShortCircuit`].
#[derive(Debug, Default)]
pub struct StatementRunner {
    policy: NoRowsPolicy,
    single_row: Toggle,
    suppress_data: Toggle,
    echo_errors: bool,
    outcome: ExecutionOutcome,
}

impl StatementRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_auto_response(
        &mut self,
        code: ResponseCode,
        message: Option<&str>,
        one_shot: bool,
    ) -> &mut Self {
        self.policy.set(code, true, one_shot, message);
        self
    }

    pub fn disable_auto_response(&mut self, code: ResponseCode) -> &mut Self {
        self.policy.set(code, false, false, None);
        self
    }

    /// Collapse non-empty results to their first row.
    pub fn set_single_row_return(&mut self, enabled: bool, one_shot: bool) -> &mut Self {
        self.single_row.set(enabled, one_shot);
        self
    }

    /// Skip fetching and casting; `data` stays empty.
    pub fn set_suppress_data_capture(&mut self, enabled: bool, one_shot: bool) -> &mut Self {
        self.suppress_data.set(enabled, one_shot);
        self
    }

    /// Put failure details in the 500 body instead of `null`.
    pub fn set_echo_errors(&mut self, echo: bool) -> &mut Self {
        self.echo_errors = echo;
        self
    }

    pub fn policy(&self) -> &NoRowsPolicy {
        &self.policy
    }

    pub fn is_single_row(&self) -> bool {
        self.single_row.enabled
    }

    pub fn is_data_suppressed(&self) -> bool {
        self.suppress_data.enabled
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }

    pub fn take_outcome(&mut self) -> ExecutionOutcome {
        std::mem::take(&mut self.outcome)
    }

    pub fn execute(
        &mut self,
        stmt: &mut dyn DbStatement,
        params: &Params,
    ) -> Result<&ExecutionOutcome, ShortCircuit> {
        let _span = tracing::error_span!("execute", sql = stmt.sql()).entered();
        self.outcome = ExecutionOutcome::default();
        let flow = self.run(stmt, params);
        self.reset_one_shots();
        flow?;
        Ok(&self.outcome)
    }

    /// Records a failure that happened before execution (e.g. prepare).
    pub fn record_failure(&mut self, e: DbError) -> ShortCircuit {
        self.outcome = ExecutionOutcome::default();
        let short = self.capture_failure(e);
        self.reset_one_shots();
        short
    }

    /// Caller-side compensation: the outcome no longer counts as a success.
    pub fn mark_failed(&mut self) {
        self.outcome.was_success = false;
    }

    fn run(&mut self, stmt: &mut dyn DbStatement, params: &Params) -> Result<(), ShortCircuit> {
        match stmt.execute(params) {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(sql = stmt.sql(), params = params.len(), "driver reported statement failure");
                return Err(HttpResponse::server_error(self.failure_detail(None)).into());
            }
            Err(e) => return Err(self.on_driver_error(e)),
        }

        self.outcome.was_success = true;
        self.outcome.row_count = stmt.row_count();

        if let Some(response) = self.policy.evaluate(self.outcome.row_count) {
            tracing::debug!(status = response.status, "no rows; short-circuiting");
            return Err(response.into());
        }

        if self.suppress_data.enabled {
            return Ok(());
        }

        let rows = if self.outcome.row_count == 0 {
            Vec::new()
        } else {
            cast_values(stmt).map_err(|e| self.capture_failure(e))?
        };

        self.outcome.data = match (self.single_row.enabled, rows.is_empty()) {
            (true, false) => Data::Row(rows.into_iter().next().unwrap_or_default()),
            _ => Data::Rows(rows),
        };
        Ok(())
    }

    fn on_driver_error(&mut self, e: DbError) -> ShortCircuit {
        if e.is_integrity_violation() {
            if let Some(response) = self.policy.on_integrity_violation() {
                tracing::debug!(sql_state = ?e.sql_state, error = %e, "constraint violation answered with 409");
                return response.into();
            }
        }
        self.capture_failure(e)
    }

    fn capture_failure(&mut self, e: DbError) -> ShortCircuit {
        tracing::error!(sql_state = ?e.sql_state, vendor_code = ?e.vendor_code, error = %e, "statement failed");
        let detail = self.failure_detail(Some(&e));
        self.outcome.was_success = false;
        self.outcome.failure_cause = Some(e);
        HttpResponse::server_error(detail).into()
    }

    fn failure_detail(&self, e: Option<&DbError>) -> Value {
        if !self.echo_errors {
            return Value::Null;
        }
        match e {
            Some(e) => json!({ "error": e.message, "sql_state": e.sql_state }),
            None => json!({ "error": "statement execution failed" }),
        }
    }

    fn reset_one_shots(&mut self) {
        self.policy.reset_one_shot();
        self.single_row.reset_one_shot();
        self.suppress_data.reset_one_shot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStatement;
    use rstest::rstest;
    use serde_json::json;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    fn users() -> ScriptedStatement {
        ScriptedStatement::select(
            &[("id", Some("LONG")), ("name", Some("VAR_STRING"))],
            vec![vec![Some("5"), Some("Alice")], vec![Some("6"), Some("Bob")]],
        )
    }

    #[rstest]
    fn test_insert_without_result_set() {
        let mut runner = StatementRunner::new();
        let mut stmt = ScriptedStatement::dml(1);
        let outcome = runner.execute(&mut stmt, &Params::new()).unwrap();
        assert!(outcome.was_success);
        assert_eq!(outcome.row_count, 1);
        assert_eq!(outcome.data, Data::Rows(vec![]));
        assert!(outcome.failure_cause.is_none());
    }

    #[rstest]
    fn test_select_casts_rows() {
        let mut runner = StatementRunner::new();
        let mut stmt = ScriptedStatement::select(
            &[("id", Some("LONG")), ("name", Some("VAR_STRING"))],
            vec![vec![Some("5"), Some("Alice")]],
        );
        let outcome = runner.execute(&mut stmt, &Params::new()).unwrap();
        assert_eq!(
            serde_json::to_value(&outcome.data).unwrap(),
            json!([{"id": 5, "name": "Alice"}])
        );
        assert!(outcome.first_row().unwrap()["id"].is_i64());
    }

    #[rstest]
    fn test_zero_rows_with_204_fires_before_casting() {
        let mut runner = StatementRunner::new();
        runner.enable_auto_response(ResponseCode::NoContent, None, false);
        let mut stmt = ScriptedStatement::select(&[("id", Some("LONG"))], vec![]);

        let short = runner.execute(&mut stmt, &Params::new()).unwrap_err();
        assert_eq!(short.status(), 204);
        assert_eq!(stmt.fetch_calls(), 0);
        assert_eq!(runner.outcome().data, Data::Empty);
        assert!(runner.outcome().was_success);
    }

    #[rstest]
    fn test_constraint_violation_with_409_skips_failure_capture() {
        let mut runner = StatementRunner::new();
        runner.enable_auto_response(ResponseCode::Conflict, Some("already exists"), false);
        let mut stmt = ScriptedStatement::dml(0).failing(
            DbError::new("Duplicate entry").with_sql_state("23000").with_vendor_code(1062),
        );

        let short = runner.execute(&mut stmt, &Params::new()).unwrap_err();
        assert_eq!(short.status(), 409);
        assert_eq!(short.response.message, "already exists");
        assert!(runner.outcome().failure_cause.is_none());
        assert!(!runner.outcome().was_success);
    }

    #[rstest]
    fn test_constraint_violation_without_409_is_server_error() {
        let mut runner = StatementRunner::new();
        runner.enable_auto_response(ResponseCode::NoContent, None, false);
        let err = DbError::new("Duplicate entry").with_sql_state("23000");
        let mut stmt = ScriptedStatement::dml(0).failing(err.clone());

        let short = runner.execute(&mut stmt, &Params::new()).unwrap_err();
        assert_eq!(short.status(), 500);
        assert_eq!(short.response.data, Value::Null);
        assert_eq!(runner.outcome().failure_cause, Some(err));
    }

    #[rstest]
    fn test_reported_failure_is_server_error_without_cause() {
        let mut runner = StatementRunner::new();
        let mut stmt = users().reporting_failure();
        let short = runner.execute(&mut stmt, &Params::new()).unwrap_err();
        assert_eq!(short.status(), 500);
        assert!(runner.outcome().failure_cause.is_none());
        assert!(!runner.outcome().was_success);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    #[rstest]
    #[case::reported(ScriptedStatement::dml(0).reporting_failure())]
    #[case::raised(ScriptedStatement::dml(0).failing(DbError::new("disk I/O error").with_sql_state("HY000")))]
    fn test_failure_log_names_the_statement(#[case] stmt: ScriptedStatement) {
        let logs = capture_logs(|| {
            let mut runner = StatementRunner::new();
            let mut stmt = stmt.with_sql("UPDATE users SET name = :name");
            assert!(runner.execute(&mut stmt, &Params::new()).is_err());
        });
        assert!(logs.contains("ERROR"), "{logs}");
        assert!(logs.contains("UPDATE users SET name = :name"), "{logs}");
    }

    #[rstest]
    fn test_echo_errors_puts_detail_in_body() {
        let mut runner = StatementRunner::new();
        runner.set_echo_errors(true);
        let mut stmt = ScriptedStatement::dml(0).failing(DbError::new("no such table: t").with_sql_state("HY000"));
        let short = runner.execute(&mut stmt, &Params::new()).unwrap_err();
        assert_eq!(
            short.response.data,
            json!({"error": "no such table: t", "sql_state": "HY000"})
        );
    }

    #[rstest]
    fn test_failure_cause_cleared_on_next_execute() {
        let mut runner = StatementRunner::new();
        let mut bad = ScriptedStatement::dml(0).failing(DbError::new("boom"));
        assert!(runner.execute(&mut bad, &Params::new()).is_err());
        assert!(runner.outcome().failure_cause.is_some());

        let mut good = ScriptedStatement::dml(1);
        let outcome = runner.execute(&mut good, &Params::new()).unwrap();
        assert!(outcome.failure_cause.is_none());
    }

    #[rstest]
    fn test_single_row_one_shot_applies_once() {
        let mut runner = StatementRunner::new();
        runner.set_single_row_return(true, true);

        let outcome = runner.execute(&mut users(), &Params::new()).unwrap();
        assert_eq!(serde_json::to_value(&outcome.data).unwrap(), json!({"id": 5, "name": "Alice"}));

        let outcome = runner.execute(&mut users(), &Params::new()).unwrap();
        assert_eq!(outcome.all_rows().len(), 2);
        assert!(!runner.is_single_row());
    }

    #[rstest]
    fn test_single_row_on_empty_result_stays_empty_sequence() {
        let mut runner = StatementRunner::new();
        runner.set_single_row_return(true, false);
        let mut stmt = ScriptedStatement::select(&[("id", Some("LONG"))], vec![]);
        let outcome = runner.execute(&mut stmt, &Params::new()).unwrap();
        assert_eq!(outcome.data, Data::Rows(vec![]));
        assert!(runner.is_single_row());
    }

    #[rstest]
    fn test_suppressed_data_is_not_fetched() {
        let mut runner = StatementRunner::new();
        runner.set_suppress_data_capture(true, true);
        let mut stmt = users();
        let outcome = runner.execute(&mut stmt, &Params::new()).unwrap();
        assert_eq!(outcome.row_count, 2);
        assert_eq!(outcome.data, Data::Empty);
        assert_eq!(stmt.fetch_calls(), 0);
        assert!(!runner.is_data_suppressed());
    }

    #[rstest]
    fn test_one_shot_rules_reset_even_when_not_fired() {
        let mut runner = StatementRunner::new();
        runner
            .enable_auto_response(ResponseCode::Forbidden, None, true)
            .enable_auto_response(ResponseCode::Unauthorized, None, false);

        assert!(runner.execute(&mut users(), &Params::new()).is_ok());
        assert!(!runner.policy().is_enabled(ResponseCode::Forbidden));
        assert!(runner.policy().is_enabled(ResponseCode::Unauthorized));
    }

    #[rstest]
    fn test_one_shot_reset_after_short_circuit() {
        let mut runner = StatementRunner::new();
        runner
            .enable_auto_response(ResponseCode::NoContent, None, false)
            .enable_auto_response(ResponseCode::Conflict, None, true);

        let short = runner.execute(&mut ScriptedStatement::dml(0), &Params::new()).unwrap_err();
        assert_eq!(short.status(), 204);
        assert!(runner.policy().is_enabled(ResponseCode::NoContent));
        assert!(!runner.policy().is_enabled(ResponseCode::Conflict));
    }

    #[rstest]
    fn test_params_reach_the_statement() {
        let mut runner = StatementRunner::new();
        let params = Params::new().with("id", 5);
        let mut stmt = ScriptedStatement::dml(1);
        runner.execute(&mut stmt, &params).unwrap();
        assert_eq!(stmt.executed_with(), Some(&params));
    }

    #[rstest]
    fn test_record_failure_and_mark_failed() {
        let mut runner = StatementRunner::new();
        runner.execute(&mut ScriptedStatement::dml(1), &Params::new()).unwrap();
        runner.mark_failed();
        assert!(!runner.outcome().was_success);

        let short = runner.record_failure(DbError::new("syntax error"));
        assert_eq!(short.status(), 500);
        assert_eq!(runner.take_outcome().failure_cause.map(|e| e.message), Some("syntax error".into()));
    }
}
