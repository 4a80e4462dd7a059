//! Connection validation and graph diagnostics.
//!
//! [`check_connection`] gates a single candidate edge at creation time and is
//! the only place the crate refuses a user action. [`diagnostics`] reports
//! suspicious structure in an existing graph without refusing anything.

pub mod diagnostics;

pub use diagnostics::{Diagnostic, diagnose, diagnose_graph};

use thiserror::Error;

use crate::catalog;
use crate::error::{DiagnosticKind, FlowError};
use crate::parse::graph::FlowGraph;
use crate::parse::types::{DType, Edge, Node, NodeKind};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("a node cannot be connected to itself")]
    SelfLoop,
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("{kind} node '{id}' has no inputs")]
    TargetHasNoInputs { id: String, kind: &'static str },
    #[error("cannot connect a {produced} output to a {expected} input")]
    TypeMismatch { produced: DType, expected: DType },
}

impl ConnectionError {
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionError::SelfLoop => "C001",
            ConnectionError::UnknownNode(_) => "C002",
            ConnectionError::TargetHasNoInputs { .. } => "C003",
            ConnectionError::TypeMismatch { .. } => "C004",
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ConnectionError::SelfLoop => DiagnosticKind::CycleDetected,
            ConnectionError::UnknownNode(_) => DiagnosticKind::DanglingEdge,
            ConnectionError::TargetHasNoInputs { .. } => DiagnosticKind::InvalidTarget,
            ConnectionError::TypeMismatch { .. } => DiagnosticKind::TypeMismatch,
        }
    }

    pub fn into_flow_error(self, candidate: &Edge) -> FlowError {
        FlowError::connect(self.code(), self.to_string(), Some(candidate.target.clone()))
    }
}

/// Dtype produced by `node` on `handle`. Unknown operators produce `Any`.
pub fn output_dtype_for_node(node: &Node, handle: Option<&str>) -> DType {
    match &node.kind {
        NodeKind::Field(d) => d.dtype,
        NodeKind::Const(d) => d.dtype,
        NodeKind::Operator(d) => catalog::lookup(&d.op_id)
            .map(|spec| spec.output_dtype(handle))
            .unwrap_or(DType::Any),
        NodeKind::Output(_) => DType::Any,
    }
}

/// Dtype expected by `node` on input `handle`. Undeclared handles accept `Any`.
pub fn input_dtype_for_target(node: &Node, handle: Option<&str>) -> DType {
    match &node.kind {
        NodeKind::Operator(d) => catalog::lookup(&d.op_id)
            .zip(handle)
            .and_then(|(spec, h)| spec.input(h))
            .map(|port| port.dtype)
            .unwrap_or(DType::Any),
        _ => DType::Any,
    }
}

/// Decide whether `candidate` may be added to `graph`.
pub fn check_connection(graph: &FlowGraph, candidate: &Edge) -> Result<(), ConnectionError> {
    let source = graph
        .node(&candidate.source)
        .ok_or_else(|| ConnectionError::UnknownNode(candidate.source.clone()))?;
    let target = graph
        .node(&candidate.target)
        .ok_or_else(|| ConnectionError::UnknownNode(candidate.target.clone()))?;

    if source.id == target.id {
        return Err(ConnectionError::SelfLoop);
    }
    if !target.accepts_inputs() {
        return Err(ConnectionError::TargetHasNoInputs {
            id: target.id.clone(),
            kind: target.node_type().as_str(),
        });
    }

    let produced = output_dtype_for_node(source, candidate.source_handle.as_deref());
    let expected = input_dtype_for_target(target, candidate.target_handle.as_deref());
    if !produced.accepts(expected) {
        return Err(ConnectionError::TypeMismatch { produced, expected });
    }
    Ok(())
}

pub fn is_valid_connection(graph: &FlowGraph, candidate: &Edge) -> bool {
    check_connection(graph, candidate).is_ok()
}
