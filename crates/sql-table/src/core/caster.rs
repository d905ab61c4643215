use std::collections::HashMap;

use serde_json::Value;

use crate::core::client::DbStatement;
use crate::core::types::DbRow;
use crate::error::DbError;

/// Native type assumed when the driver omits one.
pub const DEFAULT_NATIVE_TYPE: &str = "VAR_STRING";

/// Largest integer magnitude a double holds exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

const FLOAT_TYPES: &[&str] = &[
    "NEWDECIMAL",
    "DOUBLE",
    "DECIMAL",
    "FLOAT",
    "NUMERIC",
    "DEC",
    "FIXED",
    "REAL",
    "DOUBLE_PRECISION",
];

const INT_TYPES: &[&str] = &[
    "LONG",
    "INT24",
    "TINYINT",
    "SMALLINT",
    "INTEGER",
    "INT",
    "SHORT",
    "TINY",
    "MEDIUMINT",
    "BIT",
];

const BIGINT_TYPE: &str = "BIGINT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Float,
    Int,
    BigInt,
    /// Kept as the driver's string.
    Opaque,
}

impl TypeClass {
    pub fn classify(native_type: &str) -> Self {
        let is = |tag: &&str| tag.eq_ignore_ascii_case(native_type);
        if FLOAT_TYPES.iter().any(is) {
            TypeClass::Float
        } else if INT_TYPES.iter().any(is) {
            TypeClass::Int
        } else if BIGINT_TYPE.eq_ignore_ascii_case(native_type) {
            TypeClass::BigInt
        } else {
            TypeClass::Opaque
        }
    }
}

/// Casts one raw driver value. Unparseable numbers keep their string.
pub fn cast_value(class: TypeClass, raw: Option<String>) -> Value {
    let Some(s) = raw else { return Value::Null };
    match class {
        TypeClass::Float => match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::from(f),
            _ => Value::String(s),
        },
        TypeClass::Int => match s.parse::<i64>() {
            Ok(i) => Value::from(i),
            Err(_) => Value::String(s),
        },
        TypeClass::BigInt => match s.parse::<i64>() {
            Ok(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER as u64 => Value::from(i),
            _ => Value::String(s),
        },
        TypeClass::Opaque => Value::String(s),
    }
}

/// Drains `stmt` into casted rows, in fetch order.
///
/// A statement without columns yields no rows and is never fetched from.
pub fn cast_values(stmt: &mut dyn DbStatement) -> Result<Vec<DbRow>, DbError> {
    let column_count = stmt.column_count();
    if column_count == 0 {
        return Ok(Vec::new());
    }

    let mut classes: HashMap<String, TypeClass> = HashMap::with_capacity(column_count);
    for i in 0..column_count {
        if let Some(meta) = stmt.column_meta(i) {
            let native = meta.native_type.as_deref().unwrap_or(DEFAULT_NATIVE_TYPE);
            classes.insert(meta.name, TypeClass::classify(native));
        }
    }

    let mut rows = Vec::new();
    while let Some(raw) = stmt.fetch_row()? {
        let mut row = DbRow::with_capacity(raw.len());
        for (name, value) in raw {
            let class = classes.get(&name).copied().unwrap_or(TypeClass::Opaque);
            row.insert(name, cast_value(class, value));
        }
        rows.push(row);
    }
    Ok(rows)
}
