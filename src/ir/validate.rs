//! IR invariant validation.
//!
//! The lowering pass upholds these by construction; codegen runs the check and
//! logs any violation instead of failing.

use std::collections::HashSet;

use crate::ir::types::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Validate a Program against all invariants. Returns all errors found.
pub fn validate_ir(program: &Program) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_function_name(program, &mut errors);
    validate_unique_targets(program, &mut errors);
    validate_loop_bodies(program, &mut errors);
    validate_labels(program, &mut errors);

    errors
}

// ---------------------------------------------------------------------------
// Invariant: the entry point is a Python identifier
// ---------------------------------------------------------------------------

fn validate_function_name(program: &Program, errors: &mut Vec<ValidationError>) {
    let name = &program.function_name;
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric());
    if !valid {
        errors.push(ValidationError {
            code: "E001",
            message: format!("Function name '{}' is not a Python identifier", name),
        });
    }
}

// ---------------------------------------------------------------------------
// Invariant: every temporary and loop variable is assigned by exactly one site
// ---------------------------------------------------------------------------

fn validate_unique_targets(program: &Program, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    collect_targets(&program.body, &mut seen, errors);
}

fn collect_targets(
    stmts: &[Stmt],
    seen: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, .. } => claim(target, seen, errors),
            Stmt::Loop(l) => {
                for name in [&l.counter, &l.last, &l.iter] {
                    claim(name, seen, errors);
                }
                for inner in &l.body {
                    if let Stmt::Assign { target, .. } = inner {
                        claim(target, seen, errors);
                    }
                }
            }
            Stmt::Store { .. } => {}
        }
    }
}

fn claim(name: &str, seen: &mut HashSet<String>, errors: &mut Vec<ValidationError>) {
    if !seen.insert(name.to_string()) {
        errors.push(ValidationError {
            code: "E002",
            message: format!("Variable '{}' is assigned by more than one statement", name),
        });
    }
}

// ---------------------------------------------------------------------------
// Invariant: loop bodies only hold assignments (no nesting, no stores)
// ---------------------------------------------------------------------------

fn validate_loop_bodies(program: &Program, errors: &mut Vec<ValidationError>) {
    for stmt in &program.body {
        let Stmt::Loop(l) = stmt else { continue };
        if l.body.iter().any(|s| !matches!(s, Stmt::Assign { .. })) {
            errors.push(ValidationError {
                code: "E003",
                message: format!("Loop for '{}' contains a non-assignment statement", l.source),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: result labels are non-empty
// ---------------------------------------------------------------------------

fn validate_labels(program: &Program, errors: &mut Vec<ValidationError>) {
    for stmt in &program.body {
        if let Stmt::Store { label, .. } = stmt {
            if label.is_empty() {
                errors.push(ValidationError {
                    code: "E004",
                    message: "Result label is empty".into(),
                });
            }
        }
    }
}
