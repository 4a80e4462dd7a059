//! Variable operators. Python threads a `_vars` dict through `_set`/`_get`;
//! the interpreter keeps no variable store.

use serde_json::Value;

use super::coerce::{number_value, to_number_or};
use super::{Args, Category, CodegenResult, OpError, OperatorSpec, Port, PyArgs, simple};
use crate::parse::DType;

fn set_assign(args: &Args) -> Result<Option<Value>, OpError> {
    Ok(args.get("value").cloned())
}

fn add_assign(args: &Args) -> Result<Option<Value>, OpError> {
    Ok(Some(number_value(0.0 + to_number_or(args.get("value"), 0.0))))
}

fn set_py(args: &PyArgs) -> CodegenResult {
    CodegenResult::Single(format!(
        "_set(_vars, {}, ({}))",
        args.get("name"),
        args.get("value")
    ))
}

fn add_py(args: &PyArgs) -> CodegenResult {
    let name = args.get("name");
    CodegenResult::Single(format!(
        "_set(_vars, {name}, (_get(_vars, {name}, 0) + ({})))",
        args.get("value")
    ))
}

fn name_value() -> Vec<Port> {
    vec![
        Port::new("name", DType::String, "Name"),
        Port::new("value", DType::Any, "Value"),
    ]
}

pub(super) fn specs() -> Vec<OperatorSpec> {
    use Category::Variables;
    vec![
        simple(
            "set_assign",
            "x = value",
            Variables,
            "Assigns a variable: x = value. Returns the assigned value so you can chain it.",
            name_value(),
            DType::Any,
            set_assign,
            set_py,
        ),
        OperatorSpec {
            volatile: true,
            ..simple(
                "get_var",
                "get x",
                Variables,
                "Reads a variable set earlier with x = value (None when unset).",
                vec![Port::new("name", DType::String, "Name")],
                DType::Any,
                |_| Ok(None),
                |a| CodegenResult::Single(format!("_get(_vars, {}, None)", a.get("name"))),
            )
        },
        simple(
            "add_assign",
            "x += value",
            Variables,
            "Adds Value to variable x (starting from 0) and returns the new value.",
            name_value(),
            DType::Any,
            add_assign,
            add_py,
        ),
    ]
}
