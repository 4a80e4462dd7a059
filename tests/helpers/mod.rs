#![allow(dead_code)]

use flowpy::parse::types::*;
use serde_json::{Value, json};

// =============================================================================
// Fixtures
// =============================================================================

pub fn fixture(name: &str) -> Flow {
    let json = match name {
        "order" => include_str!("../fixtures/order.json"),
        "loop" => include_str!("../fixtures/loop.json"),
        "cycle" => include_str!("../fixtures/cycle.json"),
        "sinks" => include_str!("../fixtures/sinks.json"),
        other => panic!("no fixture named {}", other),
    };
    flowpy::parse::parse(json).expect("fixture should parse")
}

pub fn record() -> Value {
    serde_json::from_str(include_str!("../fixtures/record.json")).expect("record should parse")
}

// =============================================================================
// Node builders
// =============================================================================

pub fn num(id: &str, value: f64) -> Node {
    Node::constant(id, json!(value), DType::Number)
}

pub fn int(id: &str, value: i64) -> Node {
    Node::constant(id, json!(value), DType::Number)
}

pub fn boolean(id: &str, value: bool) -> Node {
    Node::constant(id, json!(value), DType::Boolean)
}

pub fn text(id: &str, value: &str) -> Node {
    Node::constant(id, json!(value), DType::String)
}

pub fn field(id: &str, path: &str, dtype: DType) -> Node {
    Node::field(id, path, dtype)
}

pub fn op(id: &str, op_id: &str) -> Node {
    Node::operator(id, op_id)
}

pub fn output(id: &str, label: &str) -> Node {
    Node::output(id, label)
}

/// A `while_loop` with extra per-iteration input handles.
pub fn while_with_exprs(id: &str, exprs: &[&str]) -> Node {
    Node::with_kind(
        id,
        NodeKind::Operator(OperatorData {
            op_id: "while_loop".into(),
            exprs: exprs.iter().map(|s| s.to_string()).collect(),
            label: None,
        }),
    )
}

// =============================================================================
// Edge builders
// =============================================================================

/// `source → target.port`, with an id derived from the endpoints.
pub fn wire(source: &str, target: &str, port: &str) -> Edge {
    Edge::new(format!("{}-{}-{}", source, target, port), source, target).to_port(port)
}

/// `source → output`, no handles.
pub fn sink(source: &str, target: &str) -> Edge {
    Edge::new(format!("{}-{}", source, target), source, target)
}

/// `while.body → target.port`.
pub fn body(while_id: &str, target: &str, port: &str) -> Edge {
    wire(while_id, target, port).from_port("body")
}

// =============================================================================
// Canned graphs
// =============================================================================

/// const 2 + const 3 → output "sum".
pub fn sum_flow() -> Flow {
    Flow::new(
        vec![int("c2", 2), int("c3", 3), op("add", "add"), output("o", "sum")],
        vec![wire("c2", "add", "a"), wire("c3", "add", "b"), sink("add", "o")],
    )
}

/// while(cond, max) whose body feeds `add(body, 1)` into output `label`.
pub fn loop_flow(cond: Node, max: Option<Node>, label: &str) -> Flow {
    let mut nodes = vec![cond, op("w", "while_loop"), int("one", 1), op("inc", "add")];
    let mut edges = vec![
        wire(&nodes[0].id, "w", "cond"),
        body("w", "inc", "a"),
        wire("one", "inc", "b"),
        sink("inc", "out"),
    ];
    if let Some(max) = max {
        edges.push(wire(&max.id, "w", "max"));
        nodes.push(max);
    }
    nodes.push(output("out", label));
    Flow::new(nodes, edges)
}
