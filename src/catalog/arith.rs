//! Arithmetic and text operators.

use serde_json::Value;

use super::coerce::{number_value, to_js_string, to_number_or};
use super::{Args, Category, CodegenResult, OpError, OperatorSpec, PyArgs, binary};
use crate::parse::DType;

fn operands(args: &Args) -> (f64, f64) {
    (
        to_number_or(args.get("a"), 0.0),
        to_number_or(args.get("b"), 0.0),
    )
}

fn infix(args: &PyArgs, op: &str) -> CodegenResult {
    CodegenResult::Single(format!("({} {} {})", args.get("a"), op, args.get("b")))
}

fn add(args: &Args) -> Result<Option<Value>, OpError> {
    let (a, b) = operands(args);
    Ok(Some(number_value(a + b)))
}

fn subtract(args: &Args) -> Result<Option<Value>, OpError> {
    let (a, b) = operands(args);
    Ok(Some(number_value(a - b)))
}

fn multiply(args: &Args) -> Result<Option<Value>, OpError> {
    let (a, b) = operands(args);
    Ok(Some(number_value(a * b)))
}

// Generated Python divides unguarded and raises on zero instead.
fn divide(args: &Args) -> Result<Option<Value>, OpError> {
    let (a, b) = operands(args);
    if b == 0.0 {
        return Ok(Some(Value::Null));
    }
    Ok(Some(number_value(a / b)))
}

fn concat(args: &Args) -> Result<Option<Value>, OpError> {
    let part = |v: Option<&Value>| match v {
        None | Some(Value::Null) => String::new(),
        Some(v) => to_js_string(v),
    };
    Ok(Some(Value::String(format!(
        "{}{}",
        part(args.get("a")),
        part(args.get("b"))
    ))))
}

pub(super) fn specs() -> Vec<OperatorSpec> {
    use Category::Arithmetic;
    vec![
        binary("add", "Add", Arithmetic, "Add A + B (numbers).", DType::Number, DType::Number, add, |a| {
            infix(a, "+")
        }),
        binary("subtract", "Subtract", Arithmetic, "Subtract A − B.", DType::Number, DType::Number, subtract, |a| {
            infix(a, "-")
        }),
        binary("multiply", "Multiply", Arithmetic, "Multiply A × B.", DType::Number, DType::Number, multiply, |a| {
            infix(a, "*")
        }),
        binary(
            "divide",
            "Divide",
            Arithmetic,
            "Divide A ÷ B. Returns null when B is 0.",
            DType::Number,
            DType::Number,
            divide,
            |a| infix(a, "/"),
        ),
        binary(
            "concat",
            "Concat",
            Category::Text,
            "Concatenate strings A and B.",
            DType::String,
            DType::String,
            concat,
            |a| CodegenResult::Single(format!("(str({}) + str({}))", a.get("a"), a.get("b"))),
        ),
    ]
}
