use serde::Serialize;
use serde_json::Value;

use crate::error::TableResult;

/// Response the hosting web layer should send before ending the request.
///
/// Only `message` and `data` are serialized; the status travels out of band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResponse {
    #[serde(skip)]
    pub status: u16,
    pub message: String,
    pub data: Value,
}

impl HttpResponse {
    pub fn new(status: u16, message: impl Into<String>, data: Value) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }

    pub fn no_content() -> Self {
        Self::new(204, "", Value::Null)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message, Value::Null)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message, Value::Null)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message, Value::Null)
    }

    pub fn server_error(data: Value) -> Self {
        Self::new(500, "Internal Server Error", data)
    }

    pub fn has_body(&self) -> bool {
        self.status != 204
    }

    /// JSON body `{"message": .., "data": ..}`, or `None` for 204.
    pub fn body(&self) -> TableResult<Option<String>> {
        if !self.has_body() {
            return Ok(None);
        }
        Ok(Some(serde_json::to_string(self)?))
    }
}

/// Seam to the hosting web framework: writes the response and ends the request.
pub trait ResponseEmitter {
    fn emit(&mut self, response: &HttpResponse);
}

/// Keeps every emitted response in order.
#[derive(Debug, Default)]
pub struct BufferedEmitter {
    pub responses: Vec<HttpResponse>,
}

impl BufferedEmitter {
    pub fn last(&self) -> Option<&HttpResponse> {
        self.responses.last()
    }
}

impl ResponseEmitter for BufferedEmitter {
    fn emit(&mut self, response: &HttpResponse) {
        tracing::debug!(status = response.status, "response emitted");
        self.responses.push(response.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn test_body_has_message_and_data_only() {
        let resp = HttpResponse::conflict("dup");
        assert_eq!(
            resp.body().unwrap().as_deref(),
            Some(r#"{"message":"dup","data":null}"#)
        );
    }

    #[rstest]
    fn test_no_content_has_no_body() {
        let resp = HttpResponse::no_content();
        assert_eq!(resp.status, 204);
        assert!(resp.body().unwrap().is_none());
    }

    #[rstest]
    #[case(HttpResponse::unauthorized("x"), 401)]
    #[case(HttpResponse::forbidden("x"), 403)]
    #[case(HttpResponse::conflict("x"), 409)]
    #[case(HttpResponse::server_error(json!({"error": "x"})), 500)]
    fn test_named_constructors(#[case] resp: HttpResponse, #[case] status: u16) {
        assert_eq!(resp.status, status);
        assert!(resp.has_body());
    }

    #[rstest]
    fn test_buffered_emitter_records_in_order() {
        let mut emitter = BufferedEmitter::default();
        emitter.emit(&HttpResponse::no_content());
        emitter.emit(&HttpResponse::forbidden("no"));
        assert_eq!(emitter.responses.len(), 2);
        assert_eq!(emitter.last().map(|r| r.status), Some(403));
    }
}
