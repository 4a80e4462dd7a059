//! Equality and ordering operators.

use serde_json::Value;

use super::coerce::{to_number_or, values_equal};
use super::{Args, Category, CodegenResult, OpError, OperatorSpec, PyArgs, binary};
use crate::parse::DType;

fn infix(args: &PyArgs, op: &str) -> CodegenResult {
    CodegenResult::Single(format!("({} {} {})", args.get("a"), op, args.get("b")))
}

fn ordered(args: &Args, cmp: fn(f64, f64) -> bool) -> Result<Option<Value>, OpError> {
    let a = to_number_or(args.get("a"), 0.0);
    let b = to_number_or(args.get("b"), 0.0);
    Ok(Some(Value::Bool(cmp(a, b))))
}

fn eq(args: &Args) -> Result<Option<Value>, OpError> {
    Ok(Some(Value::Bool(values_equal(args.get("a"), args.get("b")))))
}

fn ne(args: &Args) -> Result<Option<Value>, OpError> {
    Ok(Some(Value::Bool(!values_equal(args.get("a"), args.get("b")))))
}

pub(super) fn specs() -> Vec<OperatorSpec> {
    use Category::Comparison;
    use DType::{Any, Boolean, Number};
    vec![
        binary("eq", "Equals", Comparison, "True if A equals B (strict equality).", Any, Boolean, eq, |a| {
            infix(a, "==")
        }),
        binary("ne", "≠", Comparison, "True if A ≠ B.", Any, Boolean, ne, |a| infix(a, "!=")),
        binary("gt", ">", Comparison, "True if A > B.", Number, Boolean, |a| ordered(a, |x, y| x > y), |a| {
            infix(a, ">")
        }),
        binary("lt", "<", Comparison, "True if A < B.", Number, Boolean, |a| ordered(a, |x, y| x < y), |a| {
            infix(a, "<")
        }),
        binary("gte", "≥", Comparison, "True if A ≥ B.", Number, Boolean, |a| ordered(a, |x, y| x >= y), |a| {
            infix(a, ">=")
        }),
        binary("lte", "≤", Comparison, "True if A ≤ B.", Number, Boolean, |a| ordered(a, |x, y| x <= y), |a| {
            infix(a, "<=")
        }),
    ]
}
