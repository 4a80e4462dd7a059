//! Result roots: the nodes whose values land in the returned `results` dict.
//!
//! Explicit `output` nodes are the roots when any exist. Otherwise every sink
//! (a node without outgoing edges, `while_loop` excluded) becomes an implicit
//! root labeled from its slugified label, operator label or field path.

use std::collections::HashSet;

use super::scope::ScopeMap;
use crate::catalog;
use crate::codegen::literal::slug;
use crate::parse::graph::FlowGraph;
use crate::parse::types::{Node, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub node_id: String,
    pub label: String,
    /// Governing `while_loop`, if the root lies inside a loop body.
    pub scope: Option<String>,
    pub explicit: bool,
}

pub fn select_roots(graph: &FlowGraph, scopes: &ScopeMap) -> Vec<Root> {
    let outputs: Vec<&Node> = graph
        .nodes()
        .iter()
        .copied()
        .filter(|n| matches!(n.kind, NodeKind::Output(_)))
        .collect();

    if !outputs.is_empty() {
        return outputs
            .iter()
            .enumerate()
            .map(|(i, n)| Root {
                node_id: n.id.clone(),
                label: n
                    .label()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("result_{}", i + 1)),
                scope: scopes.enclosing(&n.id).map(str::to_string),
                explicit: true,
            })
            .collect();
    }

    let mut taken = HashSet::new();
    graph
        .nodes()
        .iter()
        .filter(|n| !n.is_while_loop() && graph.is_sink(&n.id))
        .map(|n| {
            let label = dedup(implicit_label(n), &mut taken);
            Root {
                node_id: n.id.clone(),
                label,
                scope: scopes.enclosing(&n.id).map(str::to_string),
                explicit: false,
            }
        })
        .collect()
}

fn implicit_label(node: &Node) -> String {
    let mut candidates = vec![node.label().unwrap_or_default().to_string()];
    match &node.kind {
        NodeKind::Operator(d) => {
            if let Some(spec) = catalog::lookup(&d.op_id) {
                candidates.push(spec.label.to_string());
            }
        }
        NodeKind::Field(d) => candidates.push(d.path.clone()),
        _ => {}
    }
    candidates
        .iter()
        .map(|c| slug(c))
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "result".into())
}

fn dedup(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
