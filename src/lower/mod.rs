//! Lowering phase: FlowGraph → Program.
//!
//! Linearizes the graph into sequential statements: loop-free temporaries in
//! topological order, then one store (or one bounded `while` block) per result
//! root. Lowering never fails; missing or cyclic pieces degrade to `None`.

pub mod names;
pub mod resolve;
pub mod roots;
pub mod scope;
pub mod topo;

use std::collections::{HashSet, VecDeque};

use crate::catalog::{self, BREAK_PORT, COND_PORT, CONTINUE_PORT, MAX_PORT};
use crate::config::Options;
use crate::ir::{Program, PyExpr, Stmt, WhileLoop};
use crate::parse::graph::FlowGraph;
use crate::parse::types::{Node, NodeKind};

use names::TempNamer;
use resolve::{ExprResolver, ResolveState};
use roots::{Root, select_roots};
use scope::ScopeMap;

pub use resolve::expr_of;

/// Lower a graph into the statement program consumed by codegen.
pub fn lower(graph: &FlowGraph, options: &Options) -> Program {
    let scopes = ScopeMap::build(graph);
    let roots = select_roots(graph, &scopes);
    let mut program = Program {
        function_name: options.function_name.clone(),
        body: Vec::new(),
    };
    if roots.is_empty() {
        return program;
    }

    let root_ids: HashSet<&str> = roots.iter().map(|r| r.node_id.as_str()).collect();
    let mut cx = LowerCx {
        graph,
        resolver: ExprResolver::new(graph),
        names: TempNamer::new(),
        root_ids,
        options,
    };

    // 1. Loop-free region
    let free: HashSet<&str> = graph
        .nodes()
        .iter()
        .filter(|n| scopes.is_free(&n.id))
        .map(|n| n.id.as_str())
        .collect();
    let mut state = ResolveState::new();
    cx.materialize(&free, &mut state, &mut program.body);

    // 2. Results
    let mut loops = 0;
    for root in &roots {
        match &root.scope {
            None => {
                let value = cx.resolver.resolve(&mut state, &root.node_id, None);
                program.body.push(Stmt::Store {
                    label: root.label.clone(),
                    value,
                });
            }
            Some(while_id) => {
                loops += 1;
                let lowered = cx.lower_loop(root, while_id, &scopes, &state);
                program.body.push(Stmt::Store {
                    label: root.label.clone(),
                    value: PyExpr::new(lowered.last.clone()),
                });
                let at = program.body.len() - 1;
                program.body.insert(at, Stmt::Loop(lowered));
            }
        }
    }

    tracing::trace!(
        roots = roots.len(),
        loops,
        statements = program.body.len(),
        "lowered graph"
    );
    program
}

struct LowerCx<'g, 'a, 'o> {
    graph: &'g FlowGraph<'a>,
    resolver: ExprResolver<'g, 'a>,
    names: TempNamer,
    root_ids: HashSet<&'g str>,
    options: &'o Options,
}

impl<'g, 'a, 'o> LowerCx<'g, 'a, 'o> {
    /// Assign a temporary to every member of `region` that needs one, in
    /// topological order, binding it in `state`.
    fn materialize(&mut self, region: &HashSet<&str>, state: &mut ResolveState, out: &mut Vec<Stmt>) {
        let candidates: HashSet<&str> = region
            .iter()
            .copied()
            .filter(|id| self.graph.node(id).is_some_and(|n| self.needs_temp(n)))
            .collect();

        for id in topo::topo_order(self.graph, &candidates) {
            let Some(node) = self.graph.node(&id) else { continue };
            let value = self.resolver.define(state, &id);
            let target = self.names.for_node(node);
            state.bind(&id, target.clone());
            out.push(Stmt::Assign { target, value });
        }
    }

    /// Fields and operators get a temporary when another computation consumes
    /// them, or when they are dangling sinks whose effect must still run.
    /// Values read only by result sinks or loop headers stay inline.
    fn needs_temp(&self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Field(_) => {}
            NodeKind::Operator(d) => match catalog::lookup(&d.op_id) {
                Some(spec) if !spec.volatile && !node.is_while_loop() => {}
                _ => return false,
            },
            NodeKind::Const(_) | NodeKind::Output(_) => return false,
        }

        let outgoing = self.graph.outgoing(&node.id);
        if outgoing.is_empty() {
            return !self.root_ids.contains(node.id.as_str());
        }
        outgoing.iter().any(|edge| {
            self.graph.node(&edge.target).is_some_and(|target| {
                !matches!(target.kind, NodeKind::Output(_)) && !target.is_while_loop()
            })
        })
    }

    fn lower_loop(
        &mut self,
        root: &Root,
        while_id: &str,
        scopes: &ScopeMap,
        free_state: &ResolveState,
    ) -> WhileLoop {
        let graph = self.graph;
        let input = |port: &str| graph.input(while_id, port);

        // Header and aux expressions run before the body assignments, so they
        // never see loop temporaries.
        let mut header = free_state.clone();
        let header_expr = |state: &mut ResolveState, port: &str| {
            input(port).map(|e| self.resolver.resolve(state, &e.source, e.source_handle.as_deref()))
        };
        let cond = header_expr(&mut header, COND_PORT).unwrap_or_else(|| PyExpr::new("False"));
        let max = header_expr(&mut header, MAX_PORT)
            .unwrap_or_else(|| PyExpr::new(self.options.default_loop_cap.to_string()));

        let mut aux: Vec<PyExpr> = Vec::new();
        let handles: &[String] = match graph.node(while_id).map(|n| &n.kind) {
            Some(NodeKind::Operator(d)) => d.exprs.as_slice(),
            _ => &[],
        };
        for handle in handles {
            if let Some(expr) = header_expr(&mut header, handle) {
                if !aux.iter().any(|a| a.to_string() == expr.to_string()) {
                    aux.push(expr);
                }
            }
        }

        let counter = self.names.fresh("i");
        let last = self.names.fresh("last");
        let iter = self.names.fresh("iter");

        let mut state = free_state.clone();
        let mut starts = vec![root.node_id.as_str()];
        starts.extend(input(CONTINUE_PORT).map(|e| e.source.as_str()));
        starts.extend(input(BREAK_PORT).map(|e| e.source.as_str()));
        let governed = governed_closure(graph, scopes, while_id, &starts);

        let mut body = Vec::new();
        self.materialize(&governed, &mut state, &mut body);

        let mut signal = |port: &str| {
            input(port).map(|e| self.resolver.resolve(&mut state, &e.source, e.source_handle.as_deref()))
        };
        let cont = signal(CONTINUE_PORT);
        let brk = signal(BREAK_PORT);
        let value = self.resolver.resolve(&mut state, &root.node_id, None);

        WhileLoop {
            source: while_id.to_string(),
            counter,
            last,
            iter,
            cond,
            max,
            aux,
            body,
            cont,
            brk,
            value,
        }
    }
}

/// Nodes governed by `while_id` that feed any of `starts`, found by walking
/// backward without leaving the loop's scope.
fn governed_closure<'g>(
    graph: &'g FlowGraph,
    scopes: &ScopeMap,
    while_id: &str,
    starts: &[&'g str],
) -> HashSet<&'g str> {
    let in_scope = |id: &str| scopes.enclosing(id) == Some(while_id);
    let mut seen = HashSet::new();
    let mut queue: VecDeque<&str> = starts.iter().copied().filter(|id| in_scope(id)).collect();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        for edge in graph.incoming(id) {
            if in_scope(&edge.source) {
                queue.push_back(edge.source.as_str());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{DType, Edge, Flow};
    use serde_json::json;

    fn lowered(flow: &Flow) -> Program {
        let g = FlowGraph::build(flow);
        lower(&g, &Options::default())
    }

    fn targets(body: &[Stmt]) -> Vec<String> {
        body.iter()
            .filter_map(|s| match s {
                Stmt::Assign { target, .. } => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn no_roots_yields_empty_body() {
        let program = lowered(&Flow::default());
        assert!(program.body.is_empty());
        assert_eq!(program.function_name, "compute");
    }

    #[test]
    fn sink_consumers_stay_inline() {
        let flow = Flow::new(
            vec![
                Node::constant("a", json!(2), DType::Number),
                Node::constant("b", json!(3), DType::Number),
                Node::operator("add", "add"),
                Node::output("o", "sum"),
            ],
            vec![
                Edge::new("e1", "a", "add").to_port("a"),
                Edge::new("e2", "b", "add").to_port("b"),
                Edge::new("e3", "add", "o"),
            ],
        );
        let program = lowered(&flow);
        assert_eq!(
            program.body,
            vec![Stmt::Store {
                label: "sum".into(),
                value: PyExpr::new("(2 + 3)"),
            }]
        );
    }

    #[test]
    fn shared_operands_become_temporaries() {
        let flow = Flow::new(
            vec![
                Node::field("f", "price", DType::Number),
                Node::operator("m", "multiply"),
                Node::output("o", "sq"),
            ],
            vec![
                Edge::new("e1", "f", "m").to_port("a"),
                Edge::new("e2", "f", "m").to_port("b"),
                Edge::new("e3", "m", "o"),
            ],
        );
        let program = lowered(&flow);
        assert_eq!(targets(&program.body), ["_price_1"]);
        assert_eq!(
            program.body[1],
            Stmt::Store {
                label: "sq".into(),
                value: PyExpr::new("(_price_1 * _price_1)"),
            }
        );
    }

    #[test]
    fn loop_root_stored_after_loop() {
        let flow = Flow::new(
            vec![
                Node::constant("t", json!(true), DType::Boolean),
                Node::constant("n", json!(3), DType::Number),
                Node::operator("w", "while_loop"),
                Node::operator("inc", "add"),
                Node::output("o", "count"),
            ],
            vec![
                Edge::new("e1", "t", "w").to_port("cond"),
                Edge::new("e2", "n", "w").to_port("max"),
                Edge::new("e3", "w", "inc").from_port("body").to_port("a"),
                Edge::new("e4", "inc", "o"),
            ],
        );
        let program = lowered(&flow);
        assert_eq!(program.body.len(), 2);
        let Stmt::Loop(l) = &program.body[0] else {
            panic!("Expected loop, got {:?}", program.body[0]);
        };
        assert_eq!(l.cond.code, "True");
        assert_eq!(l.max.code, "3");
        assert_eq!(l.value.code, "(True + None)");
        assert_eq!(
            program.body[1],
            Stmt::Store {
                label: "count".into(),
                value: PyExpr::new(l.last.clone()),
            }
        );
    }

    #[test]
    fn unconnected_loop_header_uses_defaults() {
        let flow = Flow::new(
            vec![
                Node::operator("w", "while_loop"),
                Node::operator("n", "not"),
                Node::output("o", "x"),
            ],
            vec![
                Edge::new("e1", "w", "n").from_port("body").to_port("a"),
                Edge::new("e2", "n", "o"),
            ],
        );
        let program = lowered(&flow);
        let Stmt::Loop(l) = &program.body[0] else {
            panic!("Expected loop");
        };
        assert_eq!(l.cond.code, "False");
        assert_eq!(l.max.code, "1000");
        assert!(l.cont.is_none() && l.brk.is_none());
    }

    #[test]
    fn governed_intermediates_assigned_inside_loop() {
        let flow = Flow::new(
            vec![
                Node::field("f", "x", DType::Number),
                Node::operator("w", "while_loop"),
                Node::operator("a1", "add"),
                Node::operator("a2", "multiply"),
                Node::output("o", "y"),
            ],
            vec![
                Edge::new("e1", "w", "a1").from_port("body").to_port("a"),
                Edge::new("e2", "f", "a1").to_port("b"),
                Edge::new("e3", "a1", "a2").to_port("a"),
                Edge::new("e4", "a2", "o"),
            ],
        );
        let program = lowered(&flow);
        assert_eq!(targets(&program.body), ["_x_1"]);
        let Stmt::Loop(l) = &program.body[1] else {
            panic!("Expected loop");
        };
        assert_eq!(targets(&l.body), ["_add_1"]);
        assert_eq!(l.value.code, "(_add_1 * None)");
    }

    #[test]
    fn loop_output_is_deterministic() {
        let flow = Flow::new(
            vec![
                Node::operator("w", "while_loop"),
                Node::operator("n", "not"),
                Node::output("o1", "a"),
                Node::output("o2", "b"),
            ],
            vec![
                Edge::new("e1", "w", "n").from_port("body").to_port("a"),
                Edge::new("e2", "n", "o1"),
                Edge::new("e3", "n", "o2"),
            ],
        );
        assert_eq!(lowered(&flow), lowered(&flow));
        assert!(crate::ir::validate_ir(&lowered(&flow)).is_empty());
    }
}
