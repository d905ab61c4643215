use serde_json::{Map, Value};

use crate::core::types::Params;
use crate::error::{TableError, TableResult};

/// POST and session values handed over explicitly by the web layer.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    post: Map<String, Value>,
    session: Map<String, Value>,
}

impl RequestInput {
    pub fn new(post: Map<String, Value>, session: Map<String, Value>) -> Self {
        Self { post, session }
    }

    /// Both sides must be JSON objects (or null for none).
    pub fn from_json(post: Value, session: Value) -> TableResult<Self> {
        Ok(Self::new(into_object("post", post)?, into_object("session", session)?))
    }

    pub fn post(&self, key: &str) -> Option<&Value> {
        self.post.get(key)
    }

    pub fn session(&self, key: &str) -> Option<&Value> {
        self.session.get(key)
    }

    /// Copies the named POST fields into `params`; absent fields bind null.
    pub fn bind_post(&self, params: &mut Params, keys: &[&str]) {
        bind(&self.post, params, keys);
    }

    pub fn bind_session(&self, params: &mut Params, keys: &[&str]) {
        bind(&self.session, params, keys);
    }
}

fn bind(source: &Map<String, Value>, params: &mut Params, keys: &[&str]) {
    for key in keys {
        params.set(key, source.get(*key).cloned().unwrap_or(Value::Null));
    }
}

fn into_object(side: &str, value: Value) -> TableResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(TableError::InvalidRequest(format!(
            "{side} input must be an object, got {other}"
        ))),
    }
}
