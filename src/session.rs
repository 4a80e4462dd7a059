//! Editor session: owns a graph and applies edits as discrete actions.
//!
//! Every mutation of the graph goes through [`EditorSession::dispatch`]. New
//! edges are gated by the connection validator; everything else only checks
//! that the addressed node or edge exists and has the right kind.

use std::collections::HashMap;

use serde_json::Value;

use crate::catalog::coerce::{number_value, to_number};
use crate::codegen;
use crate::config::Options;
use crate::error::{DiagnosticKind, FlowError};
use crate::eval::evaluate_with;
use crate::parse::graph::FlowGraph;
use crate::parse::types::{DType, Edge, Flow, Node, NodeKind, Position};
use crate::validate::check_connection;

/// Sequential ids, unique within one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts past every numeric id already used by `flow` (node ids `"n"`,
    /// edge ids `"e{n}"`).
    pub fn seeded(flow: &Flow) -> Self {
        let node_ids = flow.nodes.iter().map(|n| n.id.as_str());
        let edge_ids = flow
            .edges
            .iter()
            .filter_map(|e| e.id.strip_prefix('e'));
        let max = node_ids
            .chain(edge_ids)
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self { next: max + 1 }
    }

    pub fn next_id(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Drop a node from the palette. Its id is assigned by the session.
    AddNode {
        kind: NodeKind,
        position: Option<Position>,
    },
    /// Draw an edge. Replaces any edge already feeding the same target port.
    Connect(Edge),
    Disconnect { edge_id: String },
    /// Remove a node together with every incident edge.
    RemoveNode { node_id: String },
    /// Replace a const's value with `raw` editor text parsed for its dtype.
    SetConstValue { node_id: String, raw: String },
    SetOutputLabel { node_id: String, label: String },
}

#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    flow: Flow,
    ids: IdGenerator,
    options: Options,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_flow(flow: Flow, options: Options) -> Self {
        let ids = IdGenerator::seeded(&flow);
        Self { flow, ids, options }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn into_flow(self) -> Flow {
        self.flow
    }

    /// Apply one action. Returns the id of the node or edge it created, if any.
    pub fn dispatch(&mut self, action: EditorAction) -> Result<Option<String>, FlowError> {
        match action {
            EditorAction::AddNode { kind, position } => {
                let mut node = Node::with_kind(self.ids.next_id(), kind);
                node.position = position;
                let id = node.id.clone();
                tracing::debug!(node_id = %id, kind = node.node_type().as_str(), "node added");
                self.flow.nodes.push(node);
                Ok(Some(id))
            }
            EditorAction::Connect(edge) => self.connect(edge).map(Some),
            EditorAction::Disconnect { edge_id } => {
                let before = self.flow.edges.len();
                self.flow.edges.retain(|e| e.id != edge_id);
                if self.flow.edges.len() == before {
                    return Err(FlowError::session(
                        "S003",
                        format!("Unknown edge '{}'", edge_id),
                        None,
                    ));
                }
                Ok(None)
            }
            EditorAction::RemoveNode { node_id } => {
                self.node_mut(&node_id)?;
                self.flow.nodes.retain(|n| n.id != node_id);
                self.flow
                    .edges
                    .retain(|e| e.source != node_id && e.target != node_id);
                Ok(None)
            }
            EditorAction::SetConstValue { node_id, raw } => {
                let node = self.node_mut(&node_id)?;
                let NodeKind::Const(data) = &node.kind else {
                    return Err(wrong_kind(node, "const"));
                };
                let (value, issue) = parse_const_input(data.dtype, &raw);
                if let Some(kind) = issue {
                    tracing::debug!(node_id = %node_id, %kind, "const input not understood");
                }
                let mut data = data.clone();
                data.value = value;
                *node = Node {
                    id: node.id.clone(),
                    position: node.position,
                    kind: NodeKind::Const(data),
                };
                Ok(None)
            }
            EditorAction::SetOutputLabel { node_id, label } => {
                let node = self.node_mut(&node_id)?;
                match &mut node.kind {
                    NodeKind::Output(data) => {
                        data.label = label;
                        Ok(None)
                    }
                    _ => Err(wrong_kind(node, "output")),
                }
            }
        }
    }

    fn connect(&mut self, mut edge: Edge) -> Result<String, FlowError> {
        {
            let graph = FlowGraph::build(&self.flow);
            check_connection(&graph, &edge).map_err(|e| e.into_flow_error(&edge))?;
        }
        if edge.id.is_empty() {
            edge.id = format!("e{}", self.ids.next_id());
        }
        self.flow
            .edges
            .retain(|e| !(e.target == edge.target && e.target_handle == edge.target_handle));
        let id = edge.id.clone();
        self.flow.edges.push(edge);
        Ok(id)
    }

    fn node_mut(&mut self, node_id: &str) -> Result<&mut Node, FlowError> {
        self.flow
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| {
                FlowError::session(
                    "S001",
                    format!("Unknown node '{}'", node_id),
                    Some(node_id.to_string()),
                )
            })
    }

    /// Evaluate against `record` and store each output's value in its
    /// `result`. Returns how many outputs changed.
    pub fn apply_preview(&mut self, record: &Value) -> usize {
        let results: HashMap<String, Option<Value>> = {
            let graph = FlowGraph::build(&self.flow);
            let evaluation = evaluate_with(&graph, record, &self.options);
            self.flow
                .nodes
                .iter()
                .filter(|n| matches!(n.kind, NodeKind::Output(_)))
                .map(|n| (n.id.clone(), evaluation.get(&n.id).cloned()))
                .collect()
        };

        let mut changed = 0;
        for node in &mut self.flow.nodes {
            let NodeKind::Output(data) = &mut node.kind else { continue };
            let next = results.get(&node.id).cloned().flatten();
            if data.result != next {
                data.result = next;
                changed += 1;
            }
        }
        changed
    }

    pub fn generate_python(&self) -> String {
        codegen::generate_with(&self.flow, &self.options)
    }
}

fn wrong_kind(node: &Node, expected: &str) -> FlowError {
    FlowError::session(
        "S002",
        format!(
            "Node '{}' is a {} node, expected {}",
            node.id,
            node.node_type().as_str(),
            expected
        ),
        Some(node.id.clone()),
    )
}

/// Interpret raw editor text for a const of `dtype`. Numbers follow JS
/// `Number()` (unparseable text becomes null), booleans are `"true"` only,
/// lists must be a JSON array and fall back to `[]`.
pub fn parse_const_input(dtype: DType, raw: &str) -> (Value, Option<DiagnosticKind>) {
    match dtype {
        DType::Number => (number_value(to_number(Some(&Value::String(raw.to_string())))), None),
        DType::Boolean => (Value::Bool(raw == "true"), None),
        DType::List => match serde_json::from_str::<Value>(raw) {
            Ok(list @ Value::Array(_)) => (list, None),
            _ => (Value::Array(vec![]), Some(DiagnosticKind::MalformedListLiteral)),
        },
        DType::String | DType::Date | DType::Any => (Value::String(raw.to_string()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{ConstData, OutputData};
    use serde_json::json;

    fn const_kind(value: Value, dtype: DType) -> NodeKind {
        NodeKind::Const(ConstData {
            value,
            dtype,
            label: None,
        })
    }

    fn output_kind(label: &str) -> NodeKind {
        NodeKind::Output(OutputData {
            label: label.into(),
            result: None,
        })
    }

    fn add(session: &mut EditorSession, kind: NodeKind) -> String {
        session
            .dispatch(EditorAction::AddNode {
                kind,
                position: None,
            })
            .unwrap()
            .unwrap()
    }

    #[test]
    fn ids_are_sequential_per_session() {
        let mut a = EditorSession::new();
        let mut b = EditorSession::new();
        assert_eq!(add(&mut a, output_kind("x")), "1");
        assert_eq!(add(&mut a, output_kind("y")), "2");
        assert_eq!(add(&mut b, output_kind("z")), "1");
    }

    #[test]
    fn seeded_ids_skip_existing() {
        let flow = Flow::new(
            vec![Node::output("7", "x"), Node::output("out", "y")],
            vec![Edge::new("e9", "7", "out")],
        );
        let mut ids = IdGenerator::seeded(&flow);
        assert_eq!(ids.next_id(), "10");
    }

    #[test]
    fn connect_replaces_same_target_port() {
        let mut s = EditorSession::new();
        let c1 = add(&mut s, const_kind(json!(1), DType::Number));
        let c2 = add(&mut s, const_kind(json!(2), DType::Number));
        let op = add(&mut s, NodeKind::Operator(crate::parse::types::OperatorData {
            op_id: "add".into(),
            exprs: vec![],
            label: None,
        }));
        s.dispatch(EditorAction::Connect(Edge::new("", &c1, &op).to_port("a")))
            .unwrap();
        let id = s
            .dispatch(EditorAction::Connect(Edge::new("", &c2, &op).to_port("a")))
            .unwrap()
            .unwrap();
        assert_eq!(s.flow().edges.len(), 1);
        assert_eq!(s.flow().edges[0].id, id);
        assert_eq!(s.flow().edges[0].source, c2);
    }

    #[test]
    fn connect_refuses_type_mismatch() {
        let mut s = EditorSession::new();
        let c = add(&mut s, const_kind(json!(1), DType::Number));
        let op = add(&mut s, NodeKind::Operator(crate::parse::types::OperatorData {
            op_id: "not".into(),
            exprs: vec![],
            label: None,
        }));
        let err = s
            .dispatch(EditorAction::Connect(Edge::new("", &c, &op).to_port("a")))
            .unwrap_err();
        assert_eq!(err.code, "C004");
        assert!(s.flow().edges.is_empty());
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut s = EditorSession::new();
        let c = add(&mut s, const_kind(json!(1), DType::Number));
        let o = add(&mut s, output_kind("x"));
        s.dispatch(EditorAction::Connect(Edge::new("", &c, &o))).unwrap();
        s.dispatch(EditorAction::RemoveNode { node_id: c }).unwrap();
        assert_eq!(s.flow().nodes.len(), 1);
        assert!(s.flow().edges.is_empty());
    }

    #[test]
    fn unknown_targets_are_session_errors() {
        let mut s = EditorSession::new();
        let missing = s
            .dispatch(EditorAction::RemoveNode {
                node_id: "nope".into(),
            })
            .unwrap_err();
        assert_eq!(missing.code, "S001");
        let o = add(&mut s, output_kind("x"));
        let wrong = s
            .dispatch(EditorAction::SetConstValue {
                node_id: o,
                raw: "1".into(),
            })
            .unwrap_err();
        assert_eq!(wrong.code, "S002");
        let edge = s
            .dispatch(EditorAction::Disconnect {
                edge_id: "e1".into(),
            })
            .unwrap_err();
        assert_eq!(edge.code, "S003");
    }

    #[test]
    fn const_edit_and_preview() {
        let mut s = EditorSession::new();
        let c = add(&mut s, const_kind(json!(0), DType::Number));
        let o = add(&mut s, output_kind("x"));
        s.dispatch(EditorAction::Connect(Edge::new("", &c, &o))).unwrap();
        s.dispatch(EditorAction::SetConstValue {
            node_id: c,
            raw: " 42 ".into(),
        })
        .unwrap();
        assert_eq!(s.apply_preview(&json!({})), 1);
        assert_eq!(s.apply_preview(&json!({})), 0);
        match &s.flow().nodes[1].kind {
            NodeKind::Output(d) => assert_eq!(d.result, Some(json!(42))),
            other => panic!("Expected output, got {:?}", other),
        }
    }

    #[test]
    fn const_input_parsing() {
        assert_eq!(parse_const_input(DType::Number, "2.5"), (json!(2.5), None));
        assert_eq!(parse_const_input(DType::Number, "abc"), (Value::Null, None));
        assert_eq!(parse_const_input(DType::Boolean, "True"), (json!(false), None));
        assert_eq!(parse_const_input(DType::List, "[1, 2]"), (json!([1, 2]), None));
        assert_eq!(
            parse_const_input(DType::List, "{\"a\": 1}"),
            (json!([]), Some(DiagnosticKind::MalformedListLiteral))
        );
        assert_eq!(parse_const_input(DType::Date, "2024-01-01"), (json!("2024-01-01"), None));
    }
}
