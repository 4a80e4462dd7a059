//! Interpreter: evaluates every node of a graph against one JSON record.
//!
//! Evaluation is memoized per node and total: unknown operators, operator
//! failures and cycles all degrade to an undefined value. A cycle poisons
//! its members and everything reading from them, never the rest of the graph.

pub mod loops;
pub mod path;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;

use crate::catalog::{self, Args};
use crate::config::Options;
use crate::lower::roots::select_roots;
use crate::lower::scope::ScopeMap;
use crate::parse::graph::FlowGraph;
use crate::parse::types::NodeKind;

pub use path::{FieldPath, flatten_paths, get_by_path, infer_dtype};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("cycle detected at node '{0}'")]
    Cycle(String),
}

/// Per-node results. `None` is the undefined value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    values: HashMap<String, Option<Value>>,
}

impl Evaluation {
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// Defined values only, keyed by node id in sorted order.
    pub fn defined(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .filter_map(|(id, v)| v.clone().map(|v| (id.clone(), v)))
            .collect()
    }
}

/// Memo and re-entry guard threaded through one evaluation pass.
#[derive(Debug, Default)]
pub struct EvalState {
    memo: HashMap<String, Option<Value>>,
    visiting: HashSet<String>,
    /// Nodes on or downstream of a cycle; a memo hit on one re-raises it.
    cyclic: HashSet<String>,
}

pub struct Interpreter<'g, 'a> {
    graph: &'g FlowGraph<'a>,
    record: &'g Value,
    options: &'g Options,
}

impl<'g, 'a> Interpreter<'g, 'a> {
    pub fn new(graph: &'g FlowGraph<'a>, record: &'g Value, options: &'g Options) -> Self {
        Self {
            graph,
            record,
            options,
        }
    }

    /// Value of `id`. Every node on a chain that re-enters itself is memoized
    /// as undefined before the error propagates, and keeps failing on later
    /// reads so consumers end up undefined whatever order they are reached in.
    pub fn value_of(&self, state: &mut EvalState, id: &str) -> Result<Option<Value>, EvalError> {
        if state.cyclic.contains(id) {
            return Err(EvalError::Cycle(id.to_string()));
        }
        if let Some(v) = state.memo.get(id) {
            return Ok(v.clone());
        }
        if !state.visiting.insert(id.to_string()) {
            return Err(EvalError::Cycle(id.to_string()));
        }

        let result = self.compute(state, id);

        state.visiting.remove(id);
        let memoized = match &result {
            Ok(v) => v.clone(),
            Err(_) => {
                state.cyclic.insert(id.to_string());
                None
            }
        };
        state.memo.insert(id.to_string(), memoized);
        result
    }

    fn compute(&self, state: &mut EvalState, id: &str) -> Result<Option<Value>, EvalError> {
        let Some(node) = self.graph.node(id) else {
            return Ok(None);
        };

        match &node.kind {
            NodeKind::Field(d) => Ok(get_by_path(self.record, &d.path)),
            NodeKind::Const(d) => Ok(Some(d.value.clone())),
            NodeKind::Output(_) => match self.graph.output_source(id) {
                Some(edge) => self.value_of(state, &edge.source),
                None => Ok(None),
            },
            NodeKind::Operator(d) => {
                let Some(spec) = catalog::lookup(&d.op_id) else {
                    tracing::debug!(node_id = id, op_id = %d.op_id, "unknown operator");
                    return Ok(None);
                };

                // `while_loop` ignores its inputs; its header is read by `run_loop`.
                let inputs = if node.is_while_loop() { &[][..] } else { &spec.inputs[..] };
                let mut args = Args::new(self.options.max_list_len);
                for input in inputs {
                    if let Some(edge) = self.graph.input(id, input.id) {
                        args.set(input.id, self.value_of(state, &edge.source)?);
                    }
                }

                match (spec.eval)(&args) {
                    Ok(v) => Ok(v),
                    Err(e) => {
                        tracing::debug!(node_id = id, op_id = %d.op_id, error = %e, "operator failed");
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Reads the value feeding `port` on `node_id`, if connected.
    pub(crate) fn port_value(
        &self,
        state: &mut EvalState,
        node_id: &str,
        port: &str,
    ) -> Option<Option<Value>> {
        let edge = self.graph.input(node_id, port)?;
        Some(self.value_of(state, &edge.source).ok().flatten())
    }
}

/// Evaluates with default options.
pub fn evaluate(graph: &FlowGraph, record: &Value) -> Evaluation {
    evaluate_with(graph, record, &Options::default())
}

pub fn evaluate_with(graph: &FlowGraph, record: &Value, options: &Options) -> Evaluation {
    let interp = Interpreter::new(graph, record, options);
    let mut state = EvalState::default();
    let mut values = HashMap::with_capacity(graph.nodes().len());

    for node in graph.nodes() {
        let value = match interp.value_of(&mut state, &node.id) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(node_id = %node.id, error = %e, "node left undefined");
                None
            }
        };
        values.insert(node.id.clone(), value);
    }

    let scopes = ScopeMap::build(graph);
    for root in select_roots(graph, &scopes) {
        if let Some(while_id) = &root.scope {
            let run = loops::run_loop(&interp, &mut state, while_id, &root.node_id);
            values.insert(root.node_id, run.value);
        }
    }

    Evaluation { values }
}
