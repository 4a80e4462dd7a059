//! Loop scoping: the nearest `while_loop` governing each node.
//!
//! A node is governed by loop `W` when the shortest backward path over its
//! incoming edges ends on a `body` edge leaving `W`. The map is built in one
//! breadth-first sweep seeded from every body edge in document order and
//! pushed forward along non-body edges, so each node is claimed once by the
//! nearest loop.

use std::collections::{HashMap, VecDeque};

use crate::parse::graph::FlowGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMap {
    nearest: HashMap<String, String>,
}

impl ScopeMap {
    pub fn build(graph: &FlowGraph) -> Self {
        let mut nearest: HashMap<String, String> = HashMap::new();
        let mut frontier = VecDeque::new();

        for edge in graph.flow.edges.iter().filter(|e| graph.is_body_edge(e)) {
            if !nearest.contains_key(&edge.target) {
                nearest.insert(edge.target.clone(), edge.source.clone());
                frontier.push_back(edge.target.as_str());
            }
        }

        while let Some(id) = frontier.pop_front() {
            let Some(owner) = nearest.get(id).cloned() else {
                continue;
            };
            for edge in graph.outgoing(id) {
                if graph.is_body_edge(edge) || nearest.contains_key(&edge.target) {
                    continue;
                }
                nearest.insert(edge.target.clone(), owner.clone());
                frontier.push_back(edge.target.as_str());
            }
        }

        nearest.retain(|id, _| graph.node(id).is_some());
        tracing::trace!(governed = nearest.len(), "built loop scopes");
        ScopeMap { nearest }
    }

    /// Id of the `while_loop` governing `id`, if any.
    pub fn enclosing(&self, id: &str) -> Option<&str> {
        self.nearest.get(id).map(String::as_str)
    }

    pub fn is_free(&self, id: &str) -> bool {
        !self.nearest.contains_key(id)
    }
}
