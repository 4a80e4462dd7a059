//! JSON value → Python literal conversion, string quoting and slugs.

use serde_json::Value;

use crate::catalog::coerce::{to_js_string, truthy};
use crate::parse::DType;

/// Single-quoted Python string literal.
pub fn py_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

pub fn py_number(n: f64) -> String {
    if n.is_nan() {
        "float('nan')".into()
    } else if n.is_infinite() {
        if n > 0.0 { "float('inf')".into() } else { "-float('inf')".into() }
    } else if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Native Python rendering of any JSON value.
pub fn py_value(v: &Value) -> String {
    match v {
        Value::Null => "None".into(),
        Value::Bool(true) => "True".into(),
        Value::Bool(false) => "False".into(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(u)) => u.to_string(),
            _ => py_number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => py_quote(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(py_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", py_quote(k), py_value(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

/// Literal for a const node, honoring its declared dtype.
pub fn py_literal(dtype: DType, value: &Value) -> String {
    if value.is_null() {
        return "None".into();
    }
    match dtype {
        DType::Number if value.is_number() => py_value(value),
        DType::Boolean => String::from(if truthy(Some(value)) { "True" } else { "False" }),
        DType::List => match value {
            Value::Array(_) => py_value(value),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Array(_)) => py_value(&parsed),
                _ => {
                    tracing::debug!(literal = %s, "malformed list literal, using []");
                    "[]".into()
                }
            },
            _ => "[]".into(),
        },
        DType::Any => py_value(value),
        _ => py_quote(&to_js_string(value)),
    }
}

/// Lowercase identifier fragment: runs of non-alphanumerics collapse to `_`.
/// Returns an empty string when nothing usable remains.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}
