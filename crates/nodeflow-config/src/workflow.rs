use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::NodeDef;

/// A workflow as authored: an ordered node list and an ordered edge list.
///
/// Order is significant. Entry nodes are scheduled in node-list order and
/// decision branches are resolved in edge-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Branch, NodeKind};

  #[test]
  fn test_parse_workflow_definition() {
    let def: WorkflowDef = serde_json::from_str(
      r#"{
        "workflow_id": "route",
        "name": "Route",
        "nodes": [
          { "node_id": "in", "type": "input", "text": "contains foo" },
          { "node_id": "check", "type": "decision", "condition": "foo" },
          { "node_id": "yes", "type": "output" },
          { "node_id": "no", "type": "output" }
        ],
        "edges": [
          { "from": "in", "to": "check" },
          { "from": "check", "to": "yes", "branch": "true" },
          { "from": "check", "to": "no", "branch": "false" }
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(def.nodes.len(), 4);
    assert_eq!(def.nodes[0].node_id, "in");
    assert!(matches!(def.nodes[1].kind, NodeKind::Decision { .. }));
    assert_eq!(def.edges[1].branch, Some(Branch::True));
    assert_eq!(def.edges[0].branch, None);
  }

  #[test]
  fn test_edges_default_to_empty() {
    let def: WorkflowDef = serde_json::from_str(
      r#"{ "workflow_id": "w", "name": "W", "nodes": [{ "node_id": "a", "type": "merge" }] }"#,
    )
    .unwrap();
    assert!(def.edges.is_empty());
  }
}
