//! WASM entry points for browser use.
//!
//! Each export has a native `_inner` twin returning a serializable DTO, so the
//! same code paths are testable without a JS host.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::catalog::{self, Category, Port};
use crate::codegen;
use crate::config::Options;
use crate::error::FlowError;
use crate::eval::{self, FieldPath};
use crate::parse::types::Edge;
use crate::parse::{self, FlowGraph};
use crate::validate::{self, Diagnostic};

fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}

/// Evaluate a graph against a sample record.
/// Returns `{status: "success", values}` (undefined nodes omitted) or `{status: "errors", errors}`.
#[wasm_bindgen]
pub fn evaluate_graph(graph_json: &str, record_json: &str) -> JsValue {
    to_js(&evaluate_graph_inner(graph_json, record_json))
}

pub fn evaluate_graph_inner(graph_json: &str, record_json: &str) -> Outcome<BTreeMap<String, Value>> {
    let flow = match parse::parse(graph_json) {
        Ok(f) => f,
        Err(errors) => return Outcome::errors(errors),
    };
    let record = match parse::parse_record(record_json) {
        Ok(r) => r,
        Err(errors) => return Outcome::errors(errors),
    };
    let graph = FlowGraph::build(&flow);
    Outcome::Success(eval::evaluate(&graph, &record).defined())
}

/// Generate the Python module for a graph.
#[wasm_bindgen]
pub fn generate_python(graph_json: &str, options_json: Option<String>) -> JsValue {
    to_js(&generate_python_inner(graph_json, options_json.as_deref()))
}

pub fn generate_python_inner(graph_json: &str, options_json: Option<&str>) -> Outcome<String> {
    let flow = match parse::parse(graph_json) {
        Ok(f) => f,
        Err(errors) => return Outcome::errors(errors),
    };
    let options = match options_json.map(Options::from_json).transpose() {
        Ok(o) => o.unwrap_or_default(),
        Err(e) => {
            return Outcome::errors(vec![FlowError::parse(
                "P003",
                format!("Failed to parse options JSON: {}", e),
            )]);
        }
    };
    Outcome::Success(codegen::generate_with(&flow, &options))
}

/// Check a candidate edge (`{source, sourceHandle?, target, targetHandle?}`).
#[wasm_bindgen]
pub fn validate_connection(graph_json: &str, connection_json: &str) -> JsValue {
    to_js(&validate_connection_inner(graph_json, connection_json))
}

pub fn validate_connection_inner(graph_json: &str, connection_json: &str) -> ConnectionDto {
    let refuse = |error: FlowError| ConnectionDto {
        valid: false,
        error: Some(ErrorDto::from(error)),
    };

    let flow = match parse::parse(graph_json) {
        Ok(f) => f,
        Err(mut errors) => return refuse(errors.remove(0)),
    };
    let candidate = match serde_json::from_str::<Edge>(connection_json) {
        Ok(e) => e,
        Err(e) => {
            return refuse(FlowError::parse(
                "P001",
                format!("Failed to parse connection JSON: {}", e),
            ));
        }
    };

    let graph = FlowGraph::build(&flow);
    match validate::check_connection(&graph, &candidate) {
        Ok(()) => ConnectionDto {
            valid: true,
            error: None,
        },
        Err(e) => refuse(e.into_flow_error(&candidate)),
    }
}

/// Structural diagnostics (D001-D008) for a graph.
#[wasm_bindgen]
pub fn diagnose_graph(graph_json: &str) -> JsValue {
    to_js(&diagnose_graph_inner(graph_json))
}

pub fn diagnose_graph_inner(graph_json: &str) -> Outcome<Vec<Diagnostic>> {
    match parse::parse(graph_json) {
        Ok(flow) => Outcome::Success(validate::diagnose(&flow)),
        Err(errors) => Outcome::errors(errors),
    }
}

/// The operator palette.
#[wasm_bindgen]
pub fn list_operators() -> JsValue {
    to_js(&list_operators_inner())
}

pub fn list_operators_inner() -> Vec<OperatorDto> {
    catalog::all()
        .iter()
        .map(|spec| OperatorDto {
            id: spec.id,
            label: spec.label,
            category: spec.category,
            help: spec.help,
            inputs: spec.inputs.clone(),
            outputs: spec.output.ports().to_vec(),
        })
        .collect()
}

/// Field palette entries for a sample record.
#[wasm_bindgen]
pub fn discover_fields(record_json: &str) -> JsValue {
    to_js(&discover_fields_inner(record_json))
}

pub fn discover_fields_inner(record_json: &str) -> Outcome<Vec<FieldPath>> {
    match parse::parse_record(record_json) {
        Ok(record) => Outcome::Success(eval::flatten_paths(&record)),
        Err(errors) => Outcome::errors(errors),
    }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    pub code: String,
    pub phase: String,
    pub message: String,
    pub node_id: Option<String>,
}

impl From<FlowError> for ErrorDto {
    fn from(e: FlowError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            node_id: e.node_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data")]
pub enum Outcome<T> {
    #[serde(rename = "success")]
    Success(T),
    #[serde(rename = "errors")]
    Errors(Vec<ErrorDto>),
}

impl<T> Outcome<T> {
    fn errors(errors: Vec<FlowError>) -> Self {
        Outcome::Errors(errors.into_iter().map(ErrorDto::from).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionDto {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperatorDto {
    pub id: &'static str,
    pub label: &'static str,
    pub category: Category,
    pub help: &'static str,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUM: &str = r#"{
        "nodes": [
            {"id": "c2", "type": "const", "data": {"value": 2, "dtype": "number"}},
            {"id": "c3", "type": "const", "data": {"value": 3, "dtype": "number"}},
            {"id": "add", "type": "operator", "data": {"opId": "add"}},
            {"id": "o", "type": "output", "data": {"label": "sum"}}
        ],
        "edges": [
            {"id": "e1", "source": "c2", "target": "add", "targetHandle": "a"},
            {"id": "e2", "source": "c3", "target": "add", "targetHandle": "b"},
            {"id": "e3", "source": "add", "target": "o"}
        ]
    }"#;

    #[test]
    fn evaluate_inner_reports_values() {
        match evaluate_graph_inner(SUM, "{}") {
            Outcome::Success(values) => assert_eq!(values["o"], serde_json::json!(5)),
            Outcome::Errors(e) => panic!("Expected success, got {:?}", e),
        }
    }

    #[test]
    fn bad_record_is_p002() {
        match evaluate_graph_inner(SUM, "{nope") {
            Outcome::Errors(e) => assert_eq!(e[0].code, "P002"),
            Outcome::Success(_) => panic!("Expected errors"),
        }
    }

    #[test]
    fn generate_inner_accepts_partial_options() {
        match generate_python_inner(SUM, Some(r#"{"functionName": "run"}"#)) {
            Outcome::Success(code) => {
                assert!(code.contains("def run(row):"));
                assert!(code.contains("results['sum'] = (2 + 3)"));
            }
            Outcome::Errors(e) => panic!("Expected success, got {:?}", e),
        }
    }

    #[test]
    fn connection_refusal_carries_code() {
        let dto = validate_connection_inner(SUM, r#"{"source": "add", "target": "c2"}"#);
        assert!(!dto.valid);
        assert_eq!(dto.error.map(|e| e.code).as_deref(), Some("C003"));
        assert!(validate_connection_inner(SUM, r#"{"source": "c2", "target": "o"}"#).valid);
    }

    #[test]
    fn operators_listed_with_ports() {
        let ops = list_operators_inner();
        let w = ops.iter().find(|o| o.id == "while_loop").unwrap();
        assert_eq!(w.outputs.len(), 1);
        assert_eq!(w.outputs[0].id, "body");
    }
}
