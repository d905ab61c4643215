use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Driver tag such as `LONG` or `NEWDECIMAL`.
    #[serde(default)]
    pub native_type: Option<String>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, native_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.map(str::to_owned),
        }
    }
}

/// Casted row; keys keep column order.
pub type DbRow = Map<String, Value>;

/// Row as fetched from the driver: every non-null value is a string.
pub type RawRow = Vec<(String, Option<String>)>;

/// Named values bound into a statement.
///
/// Names are stored with a leading `:` unless they already carry a
/// placeholder sigil (`:`, `@`, `$`). Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to `name`, replacing any earlier value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let name = placeholder_name(name);
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = placeholder_name(name);
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let name = placeholder_name(name);
        let pos = self.entries.iter().position(|(n, _)| *n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn placeholder_name(name: &str) -> String {
    if name.starts_with([':', '@', '$']) {
        name.to_string()
    } else {
        format!(":{name}")
    }
}

/// What an execution left behind for the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Data {
    /// Nothing captured (suppressed, failed, or not executed yet).
    #[default]
    Empty,
    Rows(Vec<DbRow>),
    /// Single-row mode collapsed the result to its first row.
    Row(DbRow),
}

impl Data {
    pub fn first_row(&self) -> Option<&DbRow> {
        match self {
            Data::Empty => None,
            Data::Rows(rows) => rows.first(),
            Data::Row(row) => Some(row),
        }
    }

    pub fn all_rows(&self) -> &[DbRow] {
        match self {
            Data::Empty => &[],
            Data::Rows(rows) => rows,
            Data::Row(row) => std::slice::from_ref(row),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_rows().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub was_success: bool,
    pub row_count: u64,
    pub data: Data,
    pub failure_cause: Option<DbError>,
}

impl ExecutionOutcome {
    pub fn first_row(&self) -> Option<&DbRow> {
        self.data.first_row()
    }

    pub fn all_rows(&self) -> &[DbRow] {
        self.data.all_rows()
    }
}
