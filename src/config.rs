//! Options shared by the interpreter and the code generator.

use serde::{Deserialize, Serialize};

/// Tunables for one evaluation or generation pass.
///
/// Deserializes from partial JSON: any missing field keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Emitted as the `while` cap when a loop's `max` port is unconnected.
    pub default_loop_cap: u64,
    /// Upper bound on loop iterations performed by the interpreter.
    pub preview_iteration_cap: u64,
    /// List-producing operators fail above this many elements.
    pub max_list_len: usize,
    /// Name of the generated entry point.
    pub function_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_loop_cap: 1000,
            preview_iteration_cap: 1000,
            max_list_len: 100_000,
            function_name: "compute".into(),
        }
    }
}

impl Options {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
