//! Operators exercised through whole graphs: interpreter value and emitted Python side by side.

mod helpers;

use flowpy::catalog::{self, Category};
use flowpy::parse::types::{Flow, Node};
use flowpy::parse::{DType, FlowGraph};
use flowpy::{Options, evaluate, evaluate_with, generate};
use helpers::*;
use serde_json::{Value, json};

/// `op_id` fed by `inputs` (port, node), read by output "r".
fn single(op_id: &str, inputs: Vec<(&str, Node)>) -> Flow {
    let mut nodes = vec![op("x", op_id), output("o", "r")];
    let mut edges = vec![sink("x", "o")];
    for (port, node) in inputs {
        edges.push(wire(&node.id, "x", port));
        nodes.push(node);
    }
    Flow::new(nodes, edges)
}

fn value(flow: &Flow) -> Option<Value> {
    let g = FlowGraph::build(flow);
    evaluate(&g, &record()).get("o").cloned()
}

fn stored(flow: &Flow) -> String {
    let code = generate(flow);
    code.lines()
        .find_map(|l| l.trim().strip_prefix("results['r'] = ").map(str::to_string))
        .unwrap_or_else(|| panic!("no result line in:\n{}", code))
}

#[test]
fn palette_covers_every_category() {
    let categories: Vec<Category> = catalog::all().iter().map(|s| s.category).collect();
    for c in [
        Category::Arithmetic,
        Category::Text,
        Category::Comparison,
        Category::Logic,
        Category::Control,
        Category::Loop,
        Category::List,
        Category::Variables,
    ] {
        assert!(categories.contains(&c), "{:?} missing from palette", c);
    }
}

#[test]
fn concat_stringifies_numbers() {
    let flow = single("concat", vec![("a", text("t", "n=")), ("b", int("n", 4))]);
    assert_eq!(value(&flow), Some(json!("n=4")));
    assert_eq!(stored(&flow), "(str('n=') + str(4))");
}

#[test]
fn if_selects_branch() {
    let flow = single(
        "if",
        vec![
            ("cond", field("age", "customer.age", DType::Number)),
            ("t", text("y", "adult")),
            ("f", text("n", "minor")),
        ],
    );
    assert_eq!(value(&flow), Some(json!("adult")));
    assert_eq!(stored(&flow), "('adult' if _customer_age_1 else 'minor')");
    assert!(generate(&flow).contains("    _customer_age_1 = get_nested(row, 'customer.age')\n"));
}

#[test]
fn coalesce_skips_missing_field() {
    let flow = single(
        "coalesce",
        vec![
            ("a", field("m", "customer.missing", DType::Any)),
            ("b", text("d", "fallback")),
        ],
    );
    assert_eq!(value(&flow), Some(json!("fallback")));
    assert!(stored(&flow).starts_with("(_customer_missing_1 if _customer_missing_1 is not None"));
}

#[test]
fn equality_is_structural_over_numbers() {
    let flow = single("eq", vec![("a", int("i", 2)), ("b", num("f", 2.0))]);
    assert_eq!(value(&flow), Some(json!(true)));
    assert_eq!(stored(&flow), "(2 == 2)");
}

#[test]
fn range_then_sum() {
    let flow = Flow::new(
        vec![
            int("start", 0),
            int("stop", 5),
            int("step", 1),
            op("rng", "range"),
            op("total", "sum_list"),
            output("o", "r"),
        ],
        vec![
            wire("start", "rng", "start"),
            wire("stop", "rng", "stop"),
            wire("step", "rng", "step"),
            wire("rng", "total", "list"),
            sink("total", "o"),
        ],
    );
    assert_eq!(value(&flow), Some(json!(10)));
    let code = generate(&flow);
    assert!(code.contains("    _range_1 = list(range(0, 5, 1))\n"));
    assert!(code.contains("    results['r'] = sum(_range_1)\n"));
}

#[test]
fn oversized_list_is_undefined() {
    let flow = Flow::new(
        vec![int("stop", 50), op("rng", "range"), output("o", "r")],
        vec![wire("stop", "rng", "stop"), sink("rng", "o")],
    );
    let g = FlowGraph::build(&flow);
    let opts = Options {
        max_list_len: 10,
        ..Options::default()
    };
    assert_eq!(evaluate_with(&g, &json!({}), &opts).get("o"), None);
    assert_eq!(evaluate(&g, &json!({})).get("o").and_then(Value::as_array).map(Vec::len), Some(50));
}

#[test]
fn list_field_feeds_length() {
    let flow = single("length", vec![("list", field("tags", "tags", DType::List))]);
    assert_eq!(value(&flow), Some(json!(2)));
    assert_eq!(stored(&flow), "len(_tags_1)");
}

#[test]
fn variables_are_python_only() {
    let flow = single(
        "set_assign",
        vec![("name", text("k", "total")), ("value", int("v", 3))],
    );
    assert_eq!(value(&flow), Some(json!(3)));
    assert_eq!(stored(&flow), "_set(_vars, 'total', (3))");

    let read = single("get_var", vec![("name", text("k", "total"))]);
    assert_eq!(value(&read), None);
    assert_eq!(stored(&read), "_get(_vars, 'total', None)");
}
