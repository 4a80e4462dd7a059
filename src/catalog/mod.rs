//! Operator catalog: the static registry of operator specifications.
//!
//! Each [`OperatorSpec`] pairs an interpreter function (`eval`, JavaScript
//! coercion rules) with a Python template (`to_py`). Specs are built once on
//! first access and looked up by id. A missing id is never fatal: callers treat
//! it as "no value".

pub mod coerce;

mod arith;
mod assign;
mod boolean;
mod compare;
mod control;
mod list;

pub use control::{BREAK_PORT, COND_PORT, CONTINUE_PORT, MAX_PORT};

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::parse::DType;

pub const WHILE_LOOP: &str = "while_loop";
pub const BODY_PORT: &str = "body";
/// Output port id of every single-output operator.
pub const OUT_PORT: &str = "out";

// =============================================================================
// SPEC TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Port {
    pub id: &'static str,
    pub dtype: DType,
    pub label: &'static str,
}

impl Port {
    pub const fn new(id: &'static str, dtype: DType, label: &'static str) -> Self {
        Self { id, dtype, label }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "ports", rename_all = "lowercase")]
pub enum OutputPorts {
    Single(Port),
    Multi(Vec<Port>),
}

impl OutputPorts {
    pub fn ports(&self) -> &[Port] {
        match self {
            OutputPorts::Single(p) => std::slice::from_ref(p),
            OutputPorts::Multi(ps) => ps,
        }
    }
}

/// Palette grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Arithmetic,
    Text,
    Comparison,
    Logic,
    Control,
    Loop,
    List,
    Variables,
}

/// Output of a Python template: one expression, or one per named output port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenResult {
    Single(String),
    Multi(Vec<(&'static str, String)>),
}

impl CodegenResult {
    /// Selects the expression for `handle`. Without a handle a multi-output
    /// result yields its first port.
    pub fn port(self, handle: Option<&str>) -> Option<String> {
        match self {
            CodegenResult::Single(code) => Some(code),
            CodegenResult::Multi(ports) => match handle {
                Some(h) => ports.into_iter().find(|(id, _)| *id == h).map(|(_, c)| c),
                None => ports.into_iter().next().map(|(_, c)| c),
            },
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OpError {
    #[error("list of {len} elements exceeds the limit of {limit}")]
    ListTooLong { len: usize, limit: usize },
}

pub type EvalFn = fn(&Args) -> Result<Option<Value>, OpError>;
pub type ToPyFn = fn(&PyArgs) -> CodegenResult;

pub struct OperatorSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub category: Category,
    pub help: &'static str,
    pub inputs: Vec<Port>,
    pub output: OutputPorts,
    pub eval: EvalFn,
    pub to_py: ToPyFn,
    /// Reads state that may change between statements; never cached in a temp.
    pub volatile: bool,
}

impl OperatorSpec {
    pub fn input(&self, id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == id)
    }

    /// Dtype produced on `handle`; the first declared output when absent or unknown.
    pub fn output_dtype(&self, handle: Option<&str>) -> DType {
        let ports = self.output.ports();
        handle
            .and_then(|h| ports.iter().find(|p| p.id == h))
            .or_else(|| ports.first())
            .map(|p| p.dtype)
            .unwrap_or(DType::Any)
    }
}

impl std::fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish()
    }
}

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Resolved input values for one `eval` call. Absent names are undefined.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: HashMap<&'static str, Value>,
    max_list_len: usize,
}

impl Args {
    pub fn new(max_list_len: usize) -> Self {
        Self {
            values: HashMap::new(),
            max_list_len,
        }
    }

    pub fn with(mut self, name: &'static str, value: impl Into<Option<Value>>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn set(&mut self, name: &'static str, value: Option<Value>) {
        match value {
            Some(v) => {
                self.values.insert(name, v);
            }
            None => {
                self.values.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn list(&self, name: &str) -> Option<&Vec<Value>> {
        self.get(name).and_then(Value::as_array)
    }

    pub fn check_len(&self, len: usize) -> Result<(), OpError> {
        if len > self.max_list_len {
            return Err(OpError::ListTooLong {
                len,
                limit: self.max_list_len,
            });
        }
        Ok(())
    }
}

/// Rendered Python expressions for one `to_py` call. Absent names render `None`.
#[derive(Debug, Clone, Default)]
pub struct PyArgs {
    exprs: HashMap<&'static str, String>,
}

impl PyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, expr: impl Into<String>) -> Self {
        self.set(name, expr);
        self
    }

    pub fn set(&mut self, name: &'static str, expr: impl Into<String>) {
        self.exprs.insert(name, expr.into());
    }

    pub fn get(&self, name: &str) -> &str {
        self.exprs.get(name).map(String::as_str).unwrap_or("None")
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

struct Registry {
    specs: Vec<OperatorSpec>,
    by_id: HashMap<&'static str, usize>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let mut specs = Vec::new();
    specs.extend(arith::specs());
    specs.extend(compare::specs());
    specs.extend(boolean::specs());
    specs.extend(control::specs());
    specs.extend(list::specs());
    specs.extend(assign::specs());
    let by_id = specs.iter().enumerate().map(|(i, s)| (s.id, i)).collect();
    Registry { specs, by_id }
});

pub fn lookup(op_id: &str) -> Option<&'static OperatorSpec> {
    let registry = &*REGISTRY;
    registry.by_id.get(op_id).map(|&i| &registry.specs[i])
}

/// All specs in palette order.
pub fn all() -> &'static [OperatorSpec] {
    &REGISTRY.specs
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Two-input operator over ports `a` and `b` with output `out`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn binary(
    id: &'static str,
    label: &'static str,
    category: Category,
    help: &'static str,
    operand: DType,
    result: DType,
    eval: EvalFn,
    to_py: ToPyFn,
) -> OperatorSpec {
    OperatorSpec {
        id,
        label,
        category,
        help,
        inputs: vec![Port::new("a", operand, "A"), Port::new("b", operand, "B")],
        output: OutputPorts::Single(Port::new(OUT_PORT, result, "out")),
        eval,
        to_py,
        volatile: false,
    }
}

/// Operator with arbitrary inputs and the single output `out`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn simple(
    id: &'static str,
    label: &'static str,
    category: Category,
    help: &'static str,
    inputs: Vec<Port>,
    result: DType,
    eval: EvalFn,
    to_py: ToPyFn,
) -> OperatorSpec {
    OperatorSpec {
        id,
        label,
        category,
        help,
        inputs,
        output: OutputPorts::Single(Port::new(OUT_PORT, result, "out")),
        eval,
        to_py,
        volatile: false,
    }
}
