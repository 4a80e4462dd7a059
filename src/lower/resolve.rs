//! Handle-aware expression resolver: node (and output port) → Python expression.
//!
//! Resolution is memoized per `(node, port)` and guarded against re-entry, so
//! cyclic graphs terminate with a cycle-marked `None`. Nodes already assigned to
//! a temporary resolve to that temporary's name.

use std::collections::{HashMap, HashSet};

use crate::catalog::{self, PyArgs};
use crate::codegen::literal::{py_literal, py_quote};
use crate::ir::PyExpr;
use crate::parse::graph::FlowGraph;
use crate::parse::types::NodeKind;

type Key = (String, Option<String>);

/// Mutable resolver state threaded through one lowering scope.
#[derive(Debug, Clone, Default)]
pub struct ResolveState {
    memo: HashMap<Key, PyExpr>,
    visiting: HashSet<Key>,
    bindings: HashMap<String, String>,
}

impl ResolveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// From now on `node_id` resolves to `temp`.
    pub fn bind(&mut self, node_id: &str, temp: String) {
        self.bindings.insert(node_id.to_string(), temp);
    }

    pub fn binding(&self, node_id: &str) -> Option<&str> {
        self.bindings.get(node_id).map(String::as_str)
    }
}

pub struct ExprResolver<'g, 'a> {
    graph: &'g FlowGraph<'a>,
}

impl<'g, 'a> ExprResolver<'g, 'a> {
    pub fn new(graph: &'g FlowGraph<'a>) -> Self {
        Self { graph }
    }

    /// Expression for `id` as seen by a consumer reading `port`.
    pub fn resolve(&self, state: &mut ResolveState, id: &str, port: Option<&str>) -> PyExpr {
        if let Some(temp) = state.binding(id) {
            return PyExpr::new(temp);
        }
        self.compute(state, id, port)
    }

    /// Right-hand side for the temporary that will hold `id`.
    pub fn define(&self, state: &mut ResolveState, id: &str) -> PyExpr {
        self.compute(state, id, None)
    }

    fn compute(&self, state: &mut ResolveState, id: &str, port: Option<&str>) -> PyExpr {
        let key: Key = (id.to_string(), port.map(str::to_string));
        if let Some(expr) = state.memo.get(&key) {
            return expr.clone();
        }
        if !state.visiting.insert(key.clone()) {
            tracing::debug!(node_id = id, "cycle while resolving expression");
            return PyExpr::cycle();
        }

        let expr = self.compute_uncached(state, id, port);

        state.visiting.remove(&key);
        state.memo.insert(key, expr.clone());
        expr
    }

    fn compute_uncached(&self, state: &mut ResolveState, id: &str, port: Option<&str>) -> PyExpr {
        let Some(node) = self.graph.node(id) else {
            return PyExpr::none();
        };

        match &node.kind {
            NodeKind::Field(d) => PyExpr::new(format!("get_nested(row, {})", py_quote(&d.path))),
            NodeKind::Const(d) => PyExpr::new(py_literal(d.dtype, &d.value)),
            NodeKind::Output(_) => match self.graph.output_source(id) {
                Some(edge) => self.resolve(state, &edge.source, edge.source_handle.as_deref()),
                None => PyExpr::none(),
            },
            NodeKind::Operator(d) => {
                let Some(spec) = catalog::lookup(&d.op_id) else {
                    tracing::debug!(node_id = id, op_id = %d.op_id, "unknown operator, emitting None");
                    return PyExpr::none();
                };

                // Loop headers are read by the lowering pass, never through the
                // body tag, so signals fed back from the body are not cycles.
                let inputs = if node.is_while_loop() { &[][..] } else { &spec.inputs[..] };
                let mut args = PyArgs::new();
                let mut cycle = false;
                for input in inputs {
                    let Some(edge) = self.graph.input(id, input.id) else {
                        continue;
                    };
                    let arg = self.resolve(state, &edge.source, edge.source_handle.as_deref());
                    cycle |= arg.cycle;
                    args.set(input.id, arg.inline().to_string());
                }

                match (spec.to_py)(&args).port(port) {
                    Some(code) => PyExpr::new(code).tainted(cycle),
                    None => PyExpr::none().tainted(cycle),
                }
            }
        }
    }
}

/// One-shot resolution with a fresh state, no temporaries.
pub fn expr_of(graph: &FlowGraph, id: &str, port: Option<&str>) -> String {
    ExprResolver::new(graph)
        .resolve(&mut ResolveState::new(), id, port)
        .to_string()
}
