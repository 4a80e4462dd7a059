//! Rust types mirroring the editor's node/edge JSON.
//!
//! Nodes arrive in the React-Flow shape `{ id, type, position, data }`. The
//! `data` payload is typed per node kind; `position` is cosmetic and only
//! carried so that documents round-trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// TOP-LEVEL DOCUMENT
// =============================================================================

/// A complete graph as exchanged with the editor: node list plus edge list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Flow {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// DTYPES
// =============================================================================

/// Port/value type. `Any` matches every other dtype at connection time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Number,
    String,
    Boolean,
    Date,
    List,
    #[default]
    #[serde(other)]
    Any,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Number => "number",
            DType::String => "string",
            DType::Boolean => "boolean",
            DType::Date => "date",
            DType::List => "list",
            DType::Any => "any",
        }
    }

    /// The connection rule: identical dtypes, or either side is `Any`.
    pub fn accepts(self, other: DType) -> bool {
        self == DType::Any || other == DType::Any || self == other
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// NODE DATA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldData {
    pub path: String,
    #[serde(default)]
    pub dtype: DType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstData {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub dtype: DType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorData {
    pub op_id: String,
    /// Extra input handles evaluated once per iteration (`while_loop` only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exprs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputData {
    #[serde(default)]
    pub label: String,
    /// Last preview value. Derived, never read by the interpreter or generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

// =============================================================================
// NODE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Field,
    Const,
    Operator,
    Output,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Field => "field",
            NodeType::Const => "const",
            NodeType::Operator => "operator",
            NodeType::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Field(FieldData),
    Const(ConstData),
    Operator(OperatorData),
    Output(OutputData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: String,
    pub position: Option<Position>,
    pub kind: NodeKind,
}

impl Node {
    pub fn field(id: impl Into<String>, path: impl Into<String>, dtype: DType) -> Self {
        Self::with_kind(
            id,
            NodeKind::Field(FieldData {
                path: path.into(),
                dtype,
                label: None,
            }),
        )
    }

    pub fn constant(id: impl Into<String>, value: Value, dtype: DType) -> Self {
        Self::with_kind(
            id,
            NodeKind::Const(ConstData {
                value,
                dtype,
                label: None,
            }),
        )
    }

    pub fn operator(id: impl Into<String>, op_id: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            NodeKind::Operator(OperatorData {
                op_id: op_id.into(),
                exprs: Vec::new(),
                label: None,
            }),
        )
    }

    pub fn output(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            NodeKind::Output(OutputData {
                label: label.into(),
                result: None,
            }),
        )
    }

    pub fn with_kind(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            position: None,
            kind,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Field(_) => NodeType::Field,
            NodeKind::Const(_) => NodeType::Const,
            NodeKind::Operator(_) => NodeType::Operator,
            NodeKind::Output(_) => NodeType::Output,
        }
    }

    /// The user-facing label, if the node carries a non-empty one.
    pub fn label(&self) -> Option<&str> {
        let label = match &self.kind {
            NodeKind::Field(d) => d.label.as_deref(),
            NodeKind::Const(d) => d.label.as_deref(),
            NodeKind::Operator(d) => d.label.as_deref(),
            NodeKind::Output(d) => Some(d.label.as_str()),
        };
        label.filter(|l| !l.trim().is_empty())
    }

    pub fn op_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Operator(d) => Some(d.op_id.as_str()),
            _ => None,
        }
    }

    pub fn is_while_loop(&self) -> bool {
        self.op_id() == Some(crate::catalog::WHILE_LOOP)
    }

    /// Field and const nodes have no input ports.
    pub fn accepts_inputs(&self) -> bool {
        matches!(self.kind, NodeKind::Operator(_) | NodeKind::Output(_))
    }
}

/// Wire shape of a node; `data` is decoded according to `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
}

impl TryFrom<RawNode> for Node {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let decode_err = |e: serde_json::Error| format!("node '{}': {}", raw.id, e);
        let kind = match raw.node_type.as_str() {
            "field" => NodeKind::Field(serde_json::from_value(raw.data.clone()).map_err(decode_err)?),
            "const" => NodeKind::Const(serde_json::from_value(raw.data.clone()).map_err(decode_err)?),
            "operator" => {
                NodeKind::Operator(serde_json::from_value(raw.data.clone()).map_err(decode_err)?)
            }
            "output" => NodeKind::Output(serde_json::from_value(raw.data.clone()).map_err(decode_err)?),
            other => return Err(format!("node '{}' has unknown type '{}'", raw.id, other)),
        };
        Ok(Node {
            id: raw.id,
            position: raw.position,
            kind,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let node_type = node.node_type().as_str().to_string();
        let data = match node.kind {
            NodeKind::Field(d) => serde_json::to_value(d),
            NodeKind::Const(d) => serde_json::to_value(d),
            NodeKind::Operator(d) => serde_json::to_value(d),
            NodeKind::Output(d) => serde_json::to_value(d),
        }
        .unwrap_or(Value::Null);
        RawNode {
            id: node.id,
            node_type,
            data,
            position: node.position,
        }
    }
}

// =============================================================================
// EDGE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_handle: None,
            target: target.into(),
            target_handle: None,
        }
    }

    pub fn from_port(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn to_port(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}
