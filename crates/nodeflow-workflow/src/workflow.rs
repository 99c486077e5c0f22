use std::collections::HashMap;

use nodeflow_config::{Edge, NodeKind, WorkflowDef};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::node::Node;

/// A validated workflow ready for execution.
#[derive(Debug, Clone)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: String,
  nodes: Vec<Node>,
  edges: Vec<Edge>,
  index: HashMap<String, usize>,
}

impl Workflow {
  /// Validate nodes and edges into a workflow.
  pub fn new(
    workflow_id: impl Into<String>,
    name: impl Into<String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
  ) -> Result<Self, WorkflowError> {
    // Building the graph checks for duplicate ids and dangling edges.
    Graph::new(nodes.iter().map(|n| n.node_id.as_str()), &edges)?;

    let index = nodes
      .iter()
      .enumerate()
      .map(|(i, node)| (node.node_id.clone(), i))
      .collect();

    Ok(Self {
      workflow_id: workflow_id.into(),
      name: name.into(),
      nodes,
      edges,
      index,
    })
  }

  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Result<Graph, WorkflowError> {
    Graph::new(self.nodes.iter().map(|n| n.node_id.as_str()), &self.edges)
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  /// Nodes in definition order.
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// Replace a node's configuration. The node's kind cannot change.
  pub fn configure_node(&mut self, node_id: &str, kind: NodeKind) -> Result<(), WorkflowError> {
    let &i = self
      .index
      .get(node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))?;
    let node = &mut self.nodes[i];

    if !node.kind.same_kind(&kind) {
      return Err(WorkflowError::KindChanged {
        node_id: node_id.to_string(),
        from: node.kind.name(),
        to: kind.name(),
      });
    }

    node.kind = kind;
    Ok(())
  }
}

impl TryFrom<WorkflowDef> for Workflow {
  type Error = WorkflowError;

  fn try_from(def: WorkflowDef) -> Result<Self, Self::Error> {
    let nodes = def.nodes.into_iter().map(Node::from).collect();
    Workflow::new(def.workflow_id, def.name, nodes, def.edges)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use nodeflow_config::NodeDef;

  fn def(nodes: Vec<NodeDef>, edges: Vec<Edge>) -> WorkflowDef {
    WorkflowDef {
      workflow_id: "test".to_string(),
      name: "Test".to_string(),
      nodes,
      edges,
    }
  }

  fn input(id: &str, text: &str) -> NodeDef {
    NodeDef::new(
      id,
      NodeKind::Input {
        text: text.to_string(),
      },
    )
  }

  #[test]
  fn test_try_from_definition() {
    let workflow = Workflow::try_from(def(
      vec![input("in", "hello"), NodeDef::new("out", NodeKind::Output)],
      vec![Edge::new("in", "out")],
    ))
    .unwrap();

    assert_eq!(workflow.nodes().len(), 2);
    assert_eq!(workflow.get_node("out").unwrap().kind, NodeKind::Output);
    assert!(workflow.get_node("missing").is_none());
    assert_eq!(workflow.graph().unwrap().downstream("in"), ["out"]);
  }

  #[test]
  fn test_rejects_dangling_edge() {
    let result = Workflow::try_from(def(vec![input("in", "x")], vec![Edge::new("in", "out")]));
    assert!(matches!(result, Err(WorkflowError::InvalidEdge { .. })));
  }

  #[test]
  fn test_rejects_duplicate_node_id() {
    let result = Workflow::try_from(def(vec![input("a", "x"), input("a", "y")], vec![]));
    assert!(matches!(result, Err(WorkflowError::DuplicateNode(_))));
  }

  #[test]
  fn test_configure_node_keeps_kind() {
    let mut workflow = Workflow::try_from(def(vec![input("in", "old")], vec![])).unwrap();

    workflow
      .configure_node(
        "in",
        NodeKind::Input {
          text: "new".to_string(),
        },
      )
      .unwrap();
    assert_eq!(
      workflow.get_node("in").unwrap().kind,
      NodeKind::Input {
        text: "new".to_string()
      }
    );

    let result = workflow.configure_node("in", NodeKind::Output);
    assert!(matches!(
      result,
      Err(WorkflowError::KindChanged {
        from: "input",
        to: "output",
        ..
      })
    ));

    let result = workflow.configure_node("ghost", NodeKind::Output);
    assert!(matches!(result, Err(WorkflowError::NodeNotFound(_))));
  }
}
