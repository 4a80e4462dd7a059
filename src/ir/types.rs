//! IR type definitions for the Python generator.
//!
//! The IR bridges the node/edge graph (input) and the `compute(row)` body
//! (output). A graph is lowered into a flat list of statements: temporaries for
//! loop-free values, one bounded `while` block per loop-governed result, and
//! result stores.

use serde::{Deserialize, Serialize};

// =============================================================================
// TOP-LEVEL IR
// =============================================================================

/// Produced by the lowering pass, consumed by the codegen pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub function_name: String,
    /// Empty when the graph has no result roots.
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn has_results(&self) -> bool {
        self.body.iter().any(|s| matches!(s, Stmt::Store { .. }))
    }
}

// =============================================================================
// STATEMENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stmt {
    /// `target = value`
    Assign { target: String, value: PyExpr },
    /// `results[label] = value`
    Store { label: String, value: PyExpr },
    Loop(WhileLoop),
}

/// A capped `while` emitted for one loop-governed result.
///
/// ```text
/// counter = 0
/// last = None
/// while (bool(cond)) and counter < int(max):
///     _ = aux...
///     body...
///     if bool(cont): counter += 1; continue
///     if bool(brk): break
///     iter = value
///     if iter is not None: last = iter
///     counter += 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhileLoop {
    /// Id of the `while_loop` node this block lowers.
    pub source: String,
    pub counter: String,
    pub last: String,
    pub iter: String,
    pub cond: PyExpr,
    pub max: PyExpr,
    /// Per-iteration side expressions, deduplicated by text.
    pub aux: Vec<PyExpr>,
    /// Assignments recomputed every iteration.
    pub body: Vec<Stmt>,
    pub cont: Option<PyExpr>,
    pub brk: Option<PyExpr>,
    pub value: PyExpr,
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// A rendered Python expression. `cycle` marks expressions that depend on a
/// cyclic reference; they are emitted as `None  # cycle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PyExpr {
    pub code: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cycle: bool,
}

impl PyExpr {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            cycle: false,
        }
    }

    pub fn none() -> Self {
        Self::new("None")
    }

    pub fn cycle() -> Self {
        Self {
            code: "None".into(),
            cycle: true,
        }
    }

    pub fn tainted(mut self, cycle: bool) -> Self {
        self.cycle |= cycle;
        self
    }

    /// Code for positions where a trailing comment would break the line
    /// (loop headers, `if` tests).
    pub fn inline(&self) -> &str {
        if self.cycle { "None" } else { &self.code }
    }
}

impl std::fmt::Display for PyExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cycle {
            f.write_str("None  # cycle")
        } else {
            f.write_str(&self.code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_taint_renders_stub() {
        let e = PyExpr::new("(a + b)").tainted(true);
        assert_eq!(e.to_string(), "None  # cycle");
        assert_eq!(PyExpr::new("x").to_string(), "x");
    }

    #[test]
    fn program_without_stores_has_no_results() {
        let p = Program {
            function_name: "compute".into(),
            body: vec![Stmt::Assign {
                target: "_x_1".into(),
                value: PyExpr::none(),
            }],
        };
        assert!(!p.has_results());
    }
}
