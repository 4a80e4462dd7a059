//! Unified error type used across all phases.
//!
//! Only parsing and the editor session can refuse input outright. The interpreter
//! and the code generator are total: their local failures degrade to undefined
//! values or `None` expressions and are reported through [`DiagnosticKind`].

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Phase {
    Parse,
    Connect,
    Session,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Connect => write!(f, "Connect"),
            Phase::Session => write!(f, "Session"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    pub node_id: Option<String>,
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.phase, self.code, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.phase, self.code, self.message),
        }
    }
}

impl std::error::Error for FlowError {}

impl FlowError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        FlowError {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
            node_id: None,
        }
    }

    pub fn connect(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        FlowError {
            code: code.into(),
            phase: Phase::Connect,
            message: message.into(),
            node_id,
        }
    }

    pub fn session(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        FlowError {
            code: code.into(),
            phase: Phase::Session,
            message: message.into(),
            node_id,
        }
    }
}

/// The degradations the interpreter and generator absorb instead of raising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    UnknownOperator,
    CycleDetected,
    UnconnectedPort,
    TypeMismatch,
    DivideByZero,
    MalformedListLiteral,
    DanglingEdge,
    InvalidTarget,
    DuplicateInput,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiagnosticKind::UnknownOperator => "UnknownOperator",
            DiagnosticKind::CycleDetected => "CycleDetected",
            DiagnosticKind::UnconnectedPort => "UnconnectedPort",
            DiagnosticKind::TypeMismatch => "TypeMismatch",
            DiagnosticKind::DivideByZero => "DivideByZero",
            DiagnosticKind::MalformedListLiteral => "MalformedListLiteral",
            DiagnosticKind::DanglingEdge => "DanglingEdge",
            DiagnosticKind::InvalidTarget => "InvalidTarget",
            DiagnosticKind::DuplicateInput => "DuplicateInput",
        };
        f.write_str(name)
    }
}
