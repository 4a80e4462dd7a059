//! Dataflow graphs of typed nodes: connection checking, live evaluation
//! against a sample record, and export to a standalone Python `compute(row)`.

pub mod catalog;
pub mod codegen;
pub mod config;
pub mod error;
pub mod eval;
pub mod ir;
pub mod lower;
pub mod parse;
pub mod session;
pub mod validate;
pub mod wasm;

pub use codegen::{generate, generate_with};
pub use config::Options;
pub use error::FlowError;
pub use eval::{Evaluation, evaluate, evaluate_with};
pub use parse::{Flow, FlowGraph, parse};
pub use session::{EditorAction, EditorSession};
