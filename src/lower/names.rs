//! Readable, collision-free Python identifiers for temporaries.

use std::collections::HashSet;

use crate::catalog;
use crate::codegen::literal::slug;
use crate::parse::types::{Node, NodeKind};

#[derive(Debug, Default)]
pub struct TempNamer {
    used: HashSet<String>,
}

impl TempNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `_{base}_{n}` with the smallest `n ≥ 1` not yet handed out.
    pub fn fresh(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "tmp" } else { base };
        let mut n = 1;
        loop {
            let name = format!("_{}_{}", base, n);
            if self.used.insert(name.clone()) {
                return name;
            }
            n += 1;
        }
    }

    pub fn for_node(&mut self, node: &Node) -> String {
        self.fresh(&base_name(node))
    }
}

/// Operators use their label, then the catalog label, then the op id; fields
/// use their path.
pub fn base_name(node: &Node) -> String {
    let candidates: Vec<String> = match &node.kind {
        NodeKind::Operator(d) => {
            let spec_label = catalog::lookup(&d.op_id).map(|s| s.label).unwrap_or_default();
            vec![
                d.label.clone().unwrap_or_default(),
                spec_label.to_string(),
                d.op_id.clone(),
            ]
        }
        NodeKind::Field(d) => vec![d.label.clone().unwrap_or_default(), d.path.clone()],
        NodeKind::Const(_) => vec!["const".into()],
        NodeKind::Output(d) => vec![d.label.clone()],
    };
    candidates
        .iter()
        .map(|c| slug(c))
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "tmp".into())
}
