//! Parse phase: JSON → Rust types + graph construction.

pub mod graph;
pub mod types;

pub use graph::FlowGraph;
pub use types::*;

use serde_json::Value;

use crate::error::FlowError;

/// Deserialize a graph JSON string (`{ nodes, edges }`) into a `Flow`.
pub fn parse(json: &str) -> Result<Flow, Vec<FlowError>> {
    serde_json::from_str::<Flow>(json).map_err(|e| {
        vec![FlowError::parse(
            "P001",
            format!("Failed to parse graph JSON: {}", e),
        )]
    })
}

/// Deserialize the sample record used for evaluation.
pub fn parse_record(json: &str) -> Result<Value, Vec<FlowError>> {
    serde_json::from_str::<Value>(json).map_err(|e| {
        vec![FlowError::parse(
            "P002",
            format!("Failed to parse record JSON: {}", e),
        )]
    })
}
