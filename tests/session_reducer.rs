//! Integration tests for the editor session: palette drops, wiring, edits and preview.

mod helpers;

use flowpy::parse::types::{ConstData, Edge, NodeKind, OperatorData, OutputData, Position};
use flowpy::parse::{self, DType};
use flowpy::{EditorAction, EditorSession, Options};
use helpers::*;
use serde_json::json;

fn place(session: &mut EditorSession, kind: NodeKind) -> String {
    session
        .dispatch(EditorAction::AddNode {
            kind,
            position: Some(Position { x: 0.0, y: 0.0 }),
        })
        .expect("add node")
        .expect("node id")
}

fn number(value: i64) -> NodeKind {
    NodeKind::Const(ConstData {
        value: json!(value),
        dtype: DType::Number,
        label: None,
    })
}

fn operator(op_id: &str) -> NodeKind {
    NodeKind::Operator(OperatorData {
        op_id: op_id.into(),
        exprs: vec![],
        label: None,
    })
}

fn result(label: &str) -> NodeKind {
    NodeKind::Output(OutputData {
        label: label.into(),
        result: None,
    })
}

fn connect(session: &mut EditorSession, source: &str, target: &str, port: Option<&str>) -> String {
    let edge = Edge::new("", source, target);
    let edge = match port {
        Some(p) => edge.to_port(p),
        None => edge,
    };
    session
        .dispatch(EditorAction::Connect(edge))
        .expect("connect")
        .expect("edge id")
}

#[test]
fn build_sum_by_hand() {
    let mut s = EditorSession::new();
    let a = place(&mut s, number(2));
    let b = place(&mut s, number(3));
    let add = place(&mut s, operator("add"));
    let out = place(&mut s, result("sum"));
    assert_eq!([a.as_str(), b.as_str(), add.as_str(), out.as_str()], ["1", "2", "3", "4"]);

    assert_eq!(connect(&mut s, &a, &add, Some("a")), "e5");
    connect(&mut s, &b, &add, Some("b"));
    connect(&mut s, &add, &out, None);

    assert_eq!(s.apply_preview(&json!({})), 1);
    assert!(s.generate_python().contains("    results['sum'] = (2 + 3)\n"));

    let json = serde_json::to_string(s.flow()).unwrap();
    assert_eq!(parse::parse(&json).unwrap(), *s.flow());
}

#[test]
fn editing_a_const_changes_preview() {
    let mut s = EditorSession::from_flow(sum_flow(), Options::default());
    s.apply_preview(&json!({}));
    s.dispatch(EditorAction::SetConstValue {
        node_id: "c2".into(),
        raw: "40".into(),
    })
    .unwrap();
    assert_eq!(s.apply_preview(&json!({})), 1);
    let NodeKind::Output(out) = &s.flow().nodes[3].kind else {
        panic!("Expected output node");
    };
    assert_eq!(out.result, Some(json!(43)));
}

#[test]
fn relabel_output_changes_generated_key() {
    let mut s = EditorSession::from_flow(sum_flow(), Options::default());
    s.dispatch(EditorAction::SetOutputLabel {
        node_id: "o".into(),
        label: "total".into(),
    })
    .unwrap();
    let code = s.generate_python();
    assert!(code.contains("results['total'] = (2 + 3)"));
    assert!(!code.contains("'sum'"));
}

#[test]
fn fixture_session_continues_ids() {
    let mut s = EditorSession::from_flow(fixture("order"), Options::default());
    let id = place(&mut s, number(1));
    assert_eq!(id, "9");
    let edge = connect(&mut s, &id, "out_total", None);
    assert_eq!(edge, "e10");
    assert_eq!(s.flow().edges.iter().filter(|e| e.target == "out_total").count(), 1);
}

#[test]
fn refused_connection_leaves_graph_untouched() {
    let mut s = EditorSession::from_flow(fixture("order"), Options::default());
    let before = s.flow().clone();
    let err = s
        .dispatch(EditorAction::Connect(Edge::new("", "big", "mul").to_port("a")))
        .unwrap_err();
    assert_eq!(err.code, "C004");
    assert_eq!(*s.flow(), before);
}

#[test]
fn removing_a_node_empties_downstream_preview() {
    let mut s = EditorSession::from_flow(fixture("order"), Options::default());
    assert_eq!(s.apply_preview(&record()), 2);
    s.dispatch(EditorAction::RemoveNode {
        node_id: "add".into(),
    })
    .unwrap();
    assert!(s.flow().edges.iter().all(|e| e.source != "add" && e.target != "add"));
    assert_eq!(s.apply_preview(&record()), 2);
    let results: Vec<_> = s
        .flow()
        .nodes
        .iter()
        .filter_map(|n| match &n.kind {
            NodeKind::Output(d) => Some(d.result.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(results, [None, Some(json!(false))]);
}

#[test]
fn disconnect_by_id() {
    let mut s = EditorSession::from_flow(fixture("order"), Options::default());
    s.dispatch(EditorAction::Disconnect {
        edge_id: "e8".into(),
    })
    .unwrap();
    assert_eq!(s.flow().edges.len(), 7);
    assert!(s.generate_python().contains("results['is big'] = None"));
}

#[test]
fn malformed_list_const_falls_back_to_empty() {
    let mut s = EditorSession::new();
    let id = place(
        &mut s,
        NodeKind::Const(ConstData {
            value: json!([]),
            dtype: DType::List,
            label: None,
        }),
    );
    s.dispatch(EditorAction::SetConstValue {
        node_id: id.clone(),
        raw: "[1, 2".into(),
    })
    .unwrap();
    let NodeKind::Const(data) = &s.flow().nodes[0].kind else {
        panic!("Expected const node");
    };
    assert_eq!(data.value, json!([]));
    let out = place(&mut s, result("items"));
    connect(&mut s, &id, &out, None);
    assert!(s.generate_python().contains("results['items'] = []"));
}
