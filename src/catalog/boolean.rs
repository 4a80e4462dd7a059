//! Boolean logic, null-coalescing and conditional selection.

use serde_json::Value;

use super::coerce::truthy;
use super::{Args, Category, CodegenResult, OpError, OperatorSpec, Port, PyArgs, binary, simple};
use crate::parse::DType;

fn logic(args: &Args, f: fn(bool, bool) -> bool) -> Result<Option<Value>, OpError> {
    let a = truthy(args.get("a"));
    let b = truthy(args.get("b"));
    Ok(Some(Value::Bool(f(a, b))))
}

fn not(args: &Args) -> Result<Option<Value>, OpError> {
    Ok(Some(Value::Bool(!truthy(args.get("a")))))
}

fn coalesce(args: &Args) -> Result<Option<Value>, OpError> {
    let picked = match args.get("a") {
        None | Some(Value::Null) => args.get("b"),
        a => a,
    };
    Ok(picked.cloned())
}

// Both branches are already evaluated; selection only.
fn if_else(args: &Args) -> Result<Option<Value>, OpError> {
    let branch = if truthy(args.get("cond")) { "t" } else { "f" };
    Ok(args.get(branch).cloned())
}

fn coalesce_py(args: &PyArgs) -> CodegenResult {
    let (a, b) = (args.get("a"), args.get("b"));
    CodegenResult::Single(format!("({a} if {a} is not None else {b})"))
}

fn if_py(args: &PyArgs) -> CodegenResult {
    CodegenResult::Single(format!(
        "({} if {} else {})",
        args.get("t"),
        args.get("cond"),
        args.get("f")
    ))
}

pub(super) fn specs() -> Vec<OperatorSpec> {
    use Category::{Control, Logic};
    use DType::{Any, Boolean};
    vec![
        binary("and", "AND", Logic, "Logical AND of A and B.", Boolean, Boolean, |a| logic(a, |x, y| x && y), |a| {
            CodegenResult::Single(format!("({} and {})", a.get("a"), a.get("b")))
        }),
        binary("or", "OR", Logic, "Logical OR of A and B.", Boolean, Boolean, |a| logic(a, |x, y| x || y), |a| {
            CodegenResult::Single(format!("({} or {})", a.get("a"), a.get("b")))
        }),
        simple(
            "not",
            "NOT",
            Logic,
            "Logical NOT of A.",
            vec![Port::new("a", Boolean, "A")],
            Boolean,
            not,
            |a| CodegenResult::Single(format!("(not {})", a.get("a"))),
        ),
        binary(
            "xor",
            "XOR",
            Logic,
            "Exclusive OR: true if A and B differ.",
            Boolean,
            Boolean,
            |a| logic(a, |x, y| x != y),
            |a| CodegenResult::Single(format!("(bool({}) ^ bool({}))", a.get("a"), a.get("b"))),
        ),
        binary(
            "coalesce",
            "Coalesce",
            Logic,
            "Return A unless it is None/null, otherwise return B.",
            Any,
            Any,
            coalesce,
            coalesce_py,
        ),
        simple(
            "if",
            "If",
            Control,
            "If Cond then Then else Else.",
            vec![
                Port::new("cond", Boolean, "Cond"),
                Port::new("t", Any, "Then"),
                Port::new("f", Any, "Else"),
            ],
            Any,
            if_else,
            if_py,
        ),
    ]
}
