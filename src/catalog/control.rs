//! The bounded `while_loop` and its loop signals.
//!
//! `while_loop` computes nothing by itself. Its `body` output marks every node
//! upstream of a body edge as governed by the loop; the generator and the
//! interpreter read `cond`, `max`, `cont` and `brk` directly from its inputs.

use serde_json::Value;

use super::coerce::truthy;
use super::{
    Args, BODY_PORT, Category, CodegenResult, OpError, OperatorSpec, OutputPorts, Port, PyArgs,
    WHILE_LOOP, simple,
};
use crate::parse::DType;

pub const COND_PORT: &str = "cond";
pub const MAX_PORT: &str = "max";
pub const CONTINUE_PORT: &str = "cont";
pub const BREAK_PORT: &str = "brk";

fn signal(args: &Args) -> Result<Option<Value>, OpError> {
    Ok(Some(Value::Bool(truthy(args.get("when")))))
}

fn signal_py(args: &PyArgs) -> CodegenResult {
    CodegenResult::Single(format!("(bool({}))", args.get("when")))
}

pub(super) fn specs() -> Vec<OperatorSpec> {
    use DType::{Any, Boolean, Number};
    vec![
        OperatorSpec {
            id: WHILE_LOOP,
            label: "While",
            category: Category::Loop,
            help: "Repeat the connected body while Condition holds, at most Max times. \
                   Continue skips to the next iteration, Break stops the loop.",
            inputs: vec![
                Port::new(COND_PORT, Boolean, "Condition"),
                Port::new(MAX_PORT, Number, "Max iters"),
                Port::new(CONTINUE_PORT, Boolean, "Continue"),
                Port::new(BREAK_PORT, Boolean, "Break"),
            ],
            output: OutputPorts::Multi(vec![Port::new(BODY_PORT, Any, "Body")]),
            eval: |_| Ok(Some(Value::Bool(true))),
            to_py: |_| CodegenResult::Multi(vec![(BODY_PORT, "True".into())]),
            volatile: false,
        },
        simple(
            "break_signal",
            "Break",
            Category::Loop,
            "True when the enclosing loop should stop.",
            vec![Port::new("when", Boolean, "When")],
            Boolean,
            signal,
            signal_py,
        ),
        simple(
            "continue_signal",
            "Continue",
            Category::Loop,
            "True when the enclosing loop should skip to its next iteration.",
            vec![Port::new("when", Boolean, "When")],
            Boolean,
            signal,
            signal_py,
        ),
    ]
}
