//! Codegen pass: Flow → standalone Python source exposing `compute(row)`.
//!
//! Public API: `generate(flow) -> String`. Generation never fails and is
//! deterministic: the same graph always yields byte-identical source.

pub mod literal;

mod emit;
mod prelude;
mod writer;

use crate::config::Options;
use crate::ir::{Program, validate_ir};
use crate::lower::lower;
use crate::parse::graph::FlowGraph;
use crate::parse::types::Flow;
use emit::{RESULTS, VARS};
use writer::CodeWriter;

/// Generate Python for `flow` with default options.
pub fn generate(flow: &Flow) -> String {
    generate_with(flow, &Options::default())
}

pub fn generate_with(flow: &Flow, options: &Options) -> String {
    generate_graph(&FlowGraph::build(flow), options)
}

pub fn generate_graph(graph: &FlowGraph, options: &Options) -> String {
    let program = lower(graph, options);
    for err in validate_ir(&program) {
        tracing::warn!(code = err.code, "{}", err.message);
    }
    render(&program)
}

/// Render a lowered program, prelude included.
pub fn render(program: &Program) -> String {
    let mut w = CodeWriter::new();
    prelude::write_prelude(&mut w);

    w.block_open(&format!("def {}(row)", program.function_name));
    if program.body.is_empty() {
        w.line("# No outputs; add an Output node and connect it.");
        w.line("return {}");
    } else {
        w.line(&format!("{} = {{}}", VARS));
        w.line(&format!("{} = {{}}", RESULTS));
        emit::emit_stmts(&mut w, &program.body);
        w.line(&format!("return {}", RESULTS));
    }
    w.block_close();

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{DType, Edge, Node};
    use serde_json::json;

    #[test]
    fn empty_graph_returns_stub() {
        let code = generate(&Flow::default());
        assert!(code.contains("def compute(row):\n    # No outputs"));
        assert!(code.ends_with("    return {}\n"));
        assert!(code.starts_with("from datetime import date, datetime\nimport math\n"));
    }

    #[test]
    fn function_name_is_configurable() {
        let opts = Options {
            function_name: "score".into(),
            ..Options::default()
        };
        let flow = Flow::new(vec![Node::constant("c", json!(1), DType::Number)], vec![]);
        let code = generate_with(&flow, &opts);
        assert!(code.contains("def score(row):"));
        assert!(code.contains("    results['result'] = 1\n"));
    }

    #[test]
    fn divide_is_unguarded() {
        let flow = Flow::new(
            vec![
                Node::constant("a", json!(1), DType::Number),
                Node::constant("z", json!(0), DType::Number),
                Node::operator("d", "divide"),
                Node::output("o", "q"),
            ],
            vec![
                Edge::new("e1", "a", "d").to_port("a"),
                Edge::new("e2", "z", "d").to_port("b"),
                Edge::new("e3", "d", "o"),
            ],
        );
        assert!(generate(&flow).contains("results['q'] = (1 / 0)"));
    }
}
