//! Intermediate representation between lowering and Python codegen.

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::{ValidationError, validate_ir};
