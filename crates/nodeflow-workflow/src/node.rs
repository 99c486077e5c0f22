use nodeflow_config::{NodeDef, NodeKind};
use serde::{Deserialize, Serialize};

/// A validated node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub node_id: String,
  pub label: Option<String>,
  pub kind: NodeKind,
  pub timeout_ms: Option<u64>,
}

impl Node {
  pub fn new(node_id: impl Into<String>, kind: NodeKind) -> Self {
    Self {
      node_id: node_id.into(),
      label: None,
      kind,
      timeout_ms: None,
    }
  }

  /// Label for display, falling back to the node id.
  pub fn display_name(&self) -> &str {
    self.label.as_deref().unwrap_or(&self.node_id)
  }
}

impl From<NodeDef> for Node {
  fn from(def: NodeDef) -> Self {
    Self {
      node_id: def.node_id,
      label: def.label,
      kind: def.kind,
      timeout_ms: def.timeout_ms,
    }
  }
}
