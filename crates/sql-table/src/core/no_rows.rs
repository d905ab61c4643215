use std::collections::HashMap;

use serde::Serialize;

use crate::adapters::http::HttpResponse;
use crate::error::TableError;

/// Statuses that can answer a statement which touched no rows.
///
/// [`ResponseCode::PRIORITY`] is the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResponseCode {
    NoContent,
    Unauthorized,
    Forbidden,
    Conflict,
}

impl ResponseCode {
    pub const PRIORITY: [ResponseCode; 4] = [
        ResponseCode::NoContent,
        ResponseCode::Unauthorized,
        ResponseCode::Forbidden,
        ResponseCode::Conflict,
    ];

    pub fn status(self) -> u16 {
        match self {
            ResponseCode::NoContent => 204,
            ResponseCode::Unauthorized => 401,
            ResponseCode::Forbidden => 403,
            ResponseCode::Conflict => 409,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            ResponseCode::NoContent => "",
            ResponseCode::Unauthorized => "Unauthorized Access",
            ResponseCode::Forbidden => "You do not have permission to complete this action",
            ResponseCode::Conflict => {
                "The server was unable to handle this request to an existing record causing a conflict"
            }
        }
    }

    pub fn response(self, message: &str) -> HttpResponse {
        match self {
            ResponseCode::NoContent => HttpResponse::no_content(),
            ResponseCode::Unauthorized => HttpResponse::unauthorized(message),
            ResponseCode::Forbidden => HttpResponse::forbidden(message),
            ResponseCode::Conflict => HttpResponse::conflict(message),
        }
    }
}

impl TryFrom<u16> for ResponseCode {
    type Error = TableError;

    fn try_from(status: u16) -> Result<Self, Self::Error> {
        Self::PRIORITY
            .into_iter()
            .find(|code| code.status() == status)
            .ok_or_else(|| TableError::InvalidRequest(format!("unsupported no-rows status: {status}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoRowsRule {
    pub code: ResponseCode,
    pub enabled: bool,
    pub one_shot: bool,
    pub message: String,
}

/// Rule table deciding whether a zero-row statement ends the request.
#[derive(Debug, Clone, Default)]
pub struct NoRowsPolicy {
    rules: HashMap<ResponseCode, NoRowsRule>,
}

impl NoRowsPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// `message: None` falls back to the code's default message.
    pub fn set(&mut self, code: ResponseCode, enabled: bool, one_shot: bool, message: Option<&str>) {
        let message = message.unwrap_or(code.default_message()).to_string();
        self.rules.insert(
            code,
            NoRowsRule {
                code,
                enabled,
                one_shot,
                message,
            },
        );
    }

    pub fn is_enabled(&self, code: ResponseCode) -> bool {
        self.rules.get(&code).is_some_and(|r| r.enabled)
    }

    pub fn rule(&self, code: ResponseCode) -> Option<&NoRowsRule> {
        self.rules.get(&code)
    }

    /// First enabled rule in priority order, only when nothing was touched.
    pub fn evaluate(&self, row_count: u64) -> Option<HttpResponse> {
        if row_count != 0 {
            return None;
        }
        ResponseCode::PRIORITY
            .iter()
            .filter_map(|code| self.rules.get(code))
            .find(|r| r.enabled)
            .map(|r| r.code.response(&r.message))
    }

    /// 409 answer for a constraint violation, if that rule is on.
    pub fn on_integrity_violation(&self) -> Option<HttpResponse> {
        self.rules
            .get(&ResponseCode::Conflict)
            .filter(|r| r.enabled)
            .map(|r| r.code.response(&r.message))
    }

    /// Disables every one-shot rule, fired or not.
    pub fn reset_one_shot(&mut self) {
        for rule in self.rules.values_mut().filter(|r| r.one_shot) {
            rule.enabled = false;
            rule.one_shot = false;
        }
    }
}
