//! Topological ordering of a node subset.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::NodeIndex;

use crate::parse::graph::FlowGraph;

/// Kahn's algorithm restricted to `subset`, considering only edges between
/// members. Ties go to the lowest document position. Members left over by a
/// cycle are appended in document order.
pub fn topo_order(graph: &FlowGraph, subset: &HashSet<&str>) -> Vec<String> {
    let members: Vec<NodeIndex> = graph
        .nodes()
        .iter()
        .filter(|n| subset.contains(n.id.as_str()))
        .filter_map(|n| graph.node_indices.get(&n.id).copied())
        .collect();
    let in_subset: HashSet<NodeIndex> = members.iter().copied().collect();

    let mut in_degree: HashMap<NodeIndex, usize> = members
        .iter()
        .map(|&idx| {
            let deg = graph
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .filter(|src| in_subset.contains(src))
                .count();
            (idx, deg)
        })
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(idx, _)| Reverse(idx.index()))
        .collect();

    let mut order = Vec::with_capacity(members.len());
    let mut placed = HashSet::new();
    while let Some(Reverse(i)) = ready.pop() {
        let idx = NodeIndex::new(i);
        placed.insert(idx);
        order.push(graph.graph[idx].clone());
        for next in graph.graph.neighbors_directed(idx, Direction::Outgoing) {
            if let Some(deg) = in_degree.get_mut(&next) {
                *deg -= 1;
                if *deg == 0 {
                    ready.push(Reverse(next.index()));
                }
            }
        }
    }

    if order.len() < members.len() {
        tracing::debug!(
            leftover = members.len() - order.len(),
            "cycle in ordering, appending remaining nodes in document order"
        );
        for idx in members {
            if !placed.contains(&idx) {
                order.push(graph.graph[idx].clone());
            }
        }
    }
    order
}
