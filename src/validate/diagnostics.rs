//! Graph diagnostics (D001–D008).
//!
//! None of these refuse the graph: the interpreter and generator tolerate every
//! situation reported here. They exist so the editor can explain why a preview
//! is empty or why exported code would behave differently.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use serde::Serialize;

use super::{input_dtype_for_target, output_dtype_for_node};
use crate::catalog;
use crate::error::DiagnosticKind;
use crate::parse::graph::FlowGraph;
use crate::parse::types::{Flow, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: &'static str,
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
}

impl Diagnostic {
    fn node(code: &'static str, kind: DiagnosticKind, id: &str, message: String) -> Self {
        Self {
            code,
            kind,
            message,
            node_id: Some(id.to_string()),
            edge_id: None,
        }
    }

    fn edge(code: &'static str, kind: DiagnosticKind, id: &str, message: String) -> Self {
        Self {
            code,
            kind,
            message,
            node_id: None,
            edge_id: Some(id.to_string()),
        }
    }
}

pub fn diagnose(flow: &Flow) -> Vec<Diagnostic> {
    diagnose_graph(&FlowGraph::build(flow))
}

/// Run every rule. Results are grouped by rule, then in document order.
pub fn diagnose_graph(graph: &FlowGraph) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    d001_unknown_operators(graph, &mut out);
    d002_dangling_edges(graph, &mut out);
    d003_edges_into_sources(graph, &mut out);
    d004_duplicate_inputs(graph, &mut out);
    d005_type_mismatches(graph, &mut out);
    d006_cycles(graph, &mut out);
    d007_unguarded_division(graph, &mut out);
    d008_unconnected_inputs(graph, &mut out);

    tracing::trace!(count = out.len(), "diagnostics complete");
    out
}

fn d001_unknown_operators(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    for node in graph.nodes() {
        if let Some(op_id) = node.op_id() {
            if catalog::lookup(op_id).is_none() {
                out.push(Diagnostic::node(
                    "D001",
                    DiagnosticKind::UnknownOperator,
                    &node.id,
                    format!("Unknown operator '{}'", op_id),
                ));
            }
        }
    }
}

fn d002_dangling_edges(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    for edge in &graph.flow.edges {
        for end in [&edge.source, &edge.target] {
            if graph.node(end).is_none() {
                out.push(Diagnostic::edge(
                    "D002",
                    DiagnosticKind::DanglingEdge,
                    &edge.id,
                    format!("Edge '{}' references unknown node '{}'", edge.id, end),
                ));
            }
        }
    }
}

fn d003_edges_into_sources(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    for edge in &graph.flow.edges {
        let Some(target) = graph.node(&edge.target) else {
            continue;
        };
        if !target.accepts_inputs() {
            out.push(Diagnostic::edge(
                "D003",
                DiagnosticKind::InvalidTarget,
                &edge.id,
                format!(
                    "Edge '{}' targets {} node '{}', which has no inputs",
                    edge.id,
                    target.node_type().as_str(),
                    target.id
                ),
            ));
        }
    }
}

fn d004_duplicate_inputs(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    let mut last: HashMap<(&str, Option<&str>), &str> = HashMap::new();
    for edge in &graph.flow.edges {
        let handle = match graph.node(&edge.target).map(|n| &n.kind) {
            // Output nodes have one port whatever the handle says.
            Some(NodeKind::Output(_)) => None,
            _ => edge.target_handle.as_deref(),
        };
        if let Some(shadowed) = last.insert((edge.target.as_str(), handle), edge.id.as_str()) {
            out.push(Diagnostic::edge(
                "D004",
                DiagnosticKind::DuplicateInput,
                shadowed,
                format!(
                    "Edge '{}' is shadowed by edge '{}' on the same input of node '{}'",
                    shadowed, edge.id, edge.target
                ),
            ));
        }
    }
}

fn d005_type_mismatches(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    for edge in &graph.flow.edges {
        let (Some(source), Some(target)) = (graph.node(&edge.source), graph.node(&edge.target))
        else {
            continue;
        };
        if !target.accepts_inputs() {
            continue;
        }
        let produced = output_dtype_for_node(source, edge.source_handle.as_deref());
        let expected = input_dtype_for_target(target, edge.target_handle.as_deref());
        if !produced.accepts(expected) {
            out.push(Diagnostic::edge(
                "D005",
                DiagnosticKind::TypeMismatch,
                &edge.id,
                format!(
                    "Edge '{}' connects a {} output to a {} input",
                    edge.id, produced, expected
                ),
            ));
        }
    }
}

fn d006_cycles(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    if !graph.has_cycle() {
        return;
    }
    for component in tarjan_scc(&graph.graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.graph.contains_edge(n, n));
        if !cyclic {
            continue;
        }
        let Some(first) = component.iter().min_by_key(|idx| idx.index()) else {
            continue;
        };
        let mut members: Vec<_> = component.iter().map(|&idx| idx.index()).collect();
        members.sort_unstable();
        let names: Vec<&str> = members
            .iter()
            .map(|&i| graph.nodes()[i].id.as_str())
            .collect();
        out.push(Diagnostic::node(
            "D006",
            DiagnosticKind::CycleDetected,
            &graph.graph[*first],
            format!("Cycle through nodes {}", names.join(", ")),
        ));
    }
}

/// The interpreter yields null for a zero divisor while the generated Python
/// raises; every divisor that is not a non-zero constant is reported.
fn d007_unguarded_division(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    for node in graph.nodes() {
        if node.op_id() != Some("divide") {
            continue;
        }
        let divisor = graph.input(&node.id, "b").and_then(|e| graph.node(&e.source));
        let safe = match divisor.map(|n| &n.kind) {
            Some(NodeKind::Const(c)) => c.value.as_f64().is_some_and(|v| v != 0.0),
            _ => false,
        };
        if !safe {
            out.push(Diagnostic::node(
                "D007",
                DiagnosticKind::DivideByZero,
                &node.id,
                "Divisor may be zero: the preview yields null, exported Python raises ZeroDivisionError"
                    .to_string(),
            ));
        }
    }
}

fn d008_unconnected_inputs(graph: &FlowGraph, out: &mut Vec<Diagnostic>) {
    for node in graph.nodes() {
        match &node.kind {
            NodeKind::Operator(d) => {
                if node.is_while_loop() {
                    continue;
                }
                let Some(spec) = catalog::lookup(&d.op_id) else {
                    continue;
                };
                for port in &spec.inputs {
                    if graph.input(&node.id, port.id).is_none() {
                        out.push(Diagnostic::node(
                            "D008",
                            DiagnosticKind::UnconnectedPort,
                            &node.id,
                            format!("Input '{}' of '{}' is not connected", port.id, spec.label),
                        ));
                    }
                }
            }
            NodeKind::Output(_) => {
                if graph.output_source(&node.id).is_none() {
                    out.push(Diagnostic::node(
                        "D008",
                        DiagnosticKind::UnconnectedPort,
                        &node.id,
                        "Output is not connected".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{DType, Edge, Node};
    use serde_json::json;

    fn codes(flow: &Flow) -> Vec<&'static str> {
        diagnose(flow).into_iter().map(|d| d.code).collect()
    }

    #[test]
    fn clean_graph_has_no_diagnostics() {
        let flow = Flow::new(
            vec![
                Node::constant("a", json!(2), DType::Number),
                Node::constant("b", json!(3), DType::Number),
                Node::operator("add", "add"),
                Node::output("out", "sum"),
            ],
            vec![
                Edge::new("e1", "a", "add").to_port("a"),
                Edge::new("e2", "b", "add").to_port("b"),
                Edge::new("e3", "add", "out"),
            ],
        );
        assert!(diagnose(&flow).is_empty());
    }

    #[test]
    fn structural_problems() {
        let flow = Flow::new(
            vec![
                Node::constant("a", json!(1), DType::Number),
                Node::operator("x", "mystery"),
                Node::operator("not", "not"),
            ],
            vec![
                Edge::new("e1", "ghost", "not").to_port("a"),
                Edge::new("e2", "not", "a"),
                Edge::new("e3", "a", "not").to_port("a"),
            ],
        );
        let found = codes(&flow);
        assert!(found.contains(&"D001"));
        assert!(found.contains(&"D002"));
        assert!(found.contains(&"D003"));
        assert!(found.contains(&"D004"));
        assert!(found.contains(&"D005"));
    }

    #[test]
    fn cycles_reported_once_per_component() {
        let flow = Flow::new(
            vec![Node::operator("p", "add"), Node::operator("q", "add")],
            vec![
                Edge::new("e1", "p", "q").to_port("a"),
                Edge::new("e2", "q", "p").to_port("a"),
            ],
        );
        let cycles: Vec<_> = diagnose(&flow).into_iter().filter(|d| d.code == "D006").collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].node_id.as_deref(), Some("p"));
        assert_eq!(cycles[0].message, "Cycle through nodes p, q");
    }

    #[test]
    fn division_by_variable_is_flagged() {
        let flow = Flow::new(
            vec![
                Node::constant("one", json!(1), DType::Number),
                Node::field("d", "qty", DType::Number),
                Node::operator("safe", "divide"),
                Node::operator("risky", "divide"),
            ],
            vec![
                Edge::new("e1", "one", "safe").to_port("b"),
                Edge::new("e2", "d", "risky").to_port("b"),
            ],
        );
        let flagged: Vec<_> = diagnose(&flow)
            .into_iter()
            .filter(|d| d.code == "D007")
            .filter_map(|d| d.node_id)
            .collect();
        assert_eq!(flagged, ["risky"]);
    }

    #[test]
    fn unconnected_inputs_skip_while_loop() {
        let flow = Flow::new(
            vec![Node::operator("w", "while_loop"), Node::output("o", "r")],
            vec![],
        );
        let found = diagnose(&flow);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_id.as_deref(), Some("o"));
        assert_eq!(found[0].kind, DiagnosticKind::UnconnectedPort);
    }
}
