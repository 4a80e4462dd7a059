//! Dot-path access into evaluation records and field discovery.

use serde::Serialize;
use serde_json::Value;

use crate::parse::DType;

/// A leaf of a record, as offered in the field palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPath {
    pub path: String,
    pub dtype: DType,
}

/// Walks `path` (split on `.`) through nested objects. Any non-object on the
/// way, or a missing key, yields `None`.
pub fn get_by_path(record: &Value, path: &str) -> Option<Value> {
    let mut cur = record;
    for key in path.split('.') {
        cur = cur.as_object()?.get(key)?;
    }
    Some(cur.clone())
}

/// Every non-object leaf of `record` with its inferred dtype. Nested objects
/// are descended; arrays are leaves.
pub fn flatten_paths(record: &Value) -> Vec<FieldPath> {
    let mut out = Vec::new();
    collect(record, "", &mut out);
    out
}

fn collect(value: &Value, base: &str, out: &mut Vec<FieldPath>) {
    let Some(map) = value.as_object() else { return };
    for (key, v) in map {
        let path = if base.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", base, key)
        };
        match v {
            Value::Object(inner) if !inner.is_empty() => collect(v, &path, out),
            _ => out.push(FieldPath {
                dtype: infer_dtype(v),
                path,
            }),
        }
    }
}

/// Strings shaped `YYYY-MM-DD` (length 10, dashes at 4 and 7) are dates.
pub fn infer_dtype(value: &Value) -> DType {
    match value {
        Value::Number(_) => DType::Number,
        Value::Bool(_) => DType::Boolean,
        Value::String(s) => {
            let b = s.as_bytes();
            if b.len() == 10 && b[4] == b'-' && b[7] == b'-' {
                DType::Date
            } else {
                DType::String
            }
        }
        Value::Array(_) => DType::List,
        Value::Null | Value::Object(_) => DType::Any,
    }
}
