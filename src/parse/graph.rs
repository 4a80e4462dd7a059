//! petgraph-based directed graph wrapper over a [`Flow`].
//!
//! Construction never fails. Duplicate node ids keep their first occurrence and
//! edges whose endpoints are missing stay in the adjacency lists (so that the
//! missing side resolves to "no value") but are not added to the petgraph.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use super::types::{Edge, Flow, Node};
use crate::catalog::BODY_PORT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabel {
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

pub struct FlowGraph<'a> {
    pub flow: &'a Flow,
    pub graph: DiGraph<String, EdgeLabel>,
    pub node_indices: HashMap<String, NodeIndex>,
    order: Vec<&'a Node>,
    by_id: HashMap<&'a str, &'a Node>,
    incoming: HashMap<&'a str, Vec<&'a Edge>>,
    outgoing: HashMap<&'a str, Vec<&'a Edge>>,
}

impl<'a> FlowGraph<'a> {
    pub fn build(flow: &'a Flow) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut order = Vec::with_capacity(flow.nodes.len());
        let mut by_id = HashMap::new();

        for node in &flow.nodes {
            if by_id.contains_key(node.id.as_str()) {
                tracing::warn!(node_id = %node.id, "duplicate node id, keeping first occurrence");
                continue;
            }
            by_id.insert(node.id.as_str(), node);
            order.push(node);
            let idx = graph.add_node(node.id.clone());
            node_indices.insert(node.id.clone(), idx);
        }

        let mut incoming: HashMap<&str, Vec<&Edge>> = HashMap::new();
        let mut outgoing: HashMap<&str, Vec<&Edge>> = HashMap::new();
        for edge in &flow.edges {
            incoming.entry(edge.target.as_str()).or_default().push(edge);
            outgoing.entry(edge.source.as_str()).or_default().push(edge);

            match (node_indices.get(&edge.source), node_indices.get(&edge.target)) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(
                        s,
                        t,
                        EdgeLabel {
                            source_handle: edge.source_handle.clone(),
                            target_handle: edge.target_handle.clone(),
                        },
                    );
                }
                _ => {
                    tracing::warn!(
                        edge_id = %edge.id,
                        source = %edge.source,
                        target = %edge.target,
                        "edge references an unknown node"
                    );
                }
            }
        }

        FlowGraph {
            flow,
            graph,
            node_indices,
            order,
            by_id,
            incoming,
            outgoing,
        }
    }

    /// Nodes in document order, duplicates removed.
    pub fn nodes(&self) -> &[&'a Node] {
        &self.order
    }

    pub fn node(&self, id: &str) -> Option<&'a Node> {
        self.by_id.get(id).copied()
    }

    /// Position of the node in document order; used to break ordering ties.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.node_indices.get(id).map(|idx| idx.index())
    }

    pub fn incoming(&self, id: &str) -> &[&'a Edge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn outgoing(&self, id: &str) -> &[&'a Edge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The edge feeding `handle` on node `id`. Later edges shadow earlier ones.
    pub fn input(&self, id: &str, handle: &str) -> Option<&'a Edge> {
        self.incoming(id)
            .iter()
            .rev()
            .find(|e| e.target_handle.as_deref() == Some(handle))
            .copied()
    }

    /// The edge feeding an output node; output nodes have a single untyped port.
    pub fn output_source(&self, id: &str) -> Option<&'a Edge> {
        self.incoming(id).last().copied()
    }

    pub fn is_sink(&self, id: &str) -> bool {
        self.outgoing(id).is_empty()
    }

    /// True when `edge` leaves a `while_loop` through its `body` port. A
    /// missing handle means the first declared output, which is `body`.
    pub fn is_body_edge(&self, edge: &Edge) -> bool {
        edge.source_handle.as_deref().unwrap_or(BODY_PORT) == BODY_PORT
            && self.node(&edge.source).is_some_and(Node::is_while_loop)
    }

    pub fn successors(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(id) else {
            return vec![];
        };
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }
}
