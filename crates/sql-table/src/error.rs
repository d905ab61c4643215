use thiserror::Error;

use crate::adapters::http::{HttpResponse, ResponseEmitter};

/// SQLSTATE reported for unique and foreign-key violations.
pub const INTEGRITY_CONSTRAINT_VIOLATION: &str = "23000";

/// Error raised across the database-client boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DbError {
    pub message: String,
    pub sql_state: Option<String>,
    pub vendor_code: Option<i32>,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            vendor_code: None,
        }
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    pub fn with_vendor_code(mut self, code: i32) -> Self {
        self.vendor_code = Some(code);
        self
    }

    /// True for any SQLSTATE in class 23.
    pub fn is_integrity_violation(&self) -> bool {
        self.sql_state
            .as_deref()
            .is_some_and(|state| state.starts_with("23"))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        let failure = match &e {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure),
            rusqlite::Error::SqlInputError { error, .. } => Some(error),
            _ => None,
        };
        match failure {
            Some(failure) => {
                let sql_state = match failure.code {
                    rusqlite::ErrorCode::ConstraintViolation => INTEGRITY_CONSTRAINT_VIOLATION,
                    _ => "HY000",
                };
                DbError::new(e.to_string())
                    .with_sql_state(sql_state)
                    .with_vendor_code(failure.extended_code)
            }
            None => DbError::new(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to connect to {target}: {source}")]
    ConnectFailed {
        target: String,
        #[source]
        source: DbError,
    },

    #[error("sql error: {0}")]
    Driver(#[from] DbError),

    #[error("connection is closed")]
    NoConnection,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<clap::Error> for TableError {
    fn from(e: clap::Error) -> Self {
        TableError::Config(e.to_string())
    }
}

impl TableError {
    pub fn code(&self) -> &'static str {
        match self {
            TableError::InvalidRequest(_) => "INVALID_REQUEST",
            TableError::ConnectFailed { .. } => "CONNECT_FAILED",
            TableError::Driver(_) => "SQL_ERROR",
            TableError::NoConnection => "NO_CONNECTION",
            TableError::Config(_) => "CONFIG_ERROR",
            TableError::Json(_) => "JSON_ERROR",
            TableError::Internal(_) => "INTERNAL",
        }
    }

    /// Flattens into the driver-level error recorded as a failure cause.
    pub fn into_db_error(self) -> DbError {
        match self {
            TableError::Driver(e) => e,
            TableError::ConnectFailed { source, .. } => source,
            other => DbError::new(other.to_string()),
        }
    }
}

pub type TableResult<T> = Result<T, TableError>;

/// The request must stop here and be answered with `response`.
///
/// Returned on the `Err` side of statement execution so the hosting web layer
/// decides how to terminate the request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("request short-circuited with HTTP {}", .response.status)]
pub struct ShortCircuit {
    pub response: HttpResponse,
}

impl ShortCircuit {
    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn into_response(self) -> HttpResponse {
        self.response
    }

    pub fn emit_with(&self, emitter: &mut dyn ResponseEmitter) {
        emitter.emit(&self.response);
    }
}

impl From<HttpResponse> for ShortCircuit {
    fn from(response: HttpResponse) -> Self {
        Self { response }
    }
}
