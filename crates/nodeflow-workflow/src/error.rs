use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("cannot change kind of node '{node_id}' from {from} to {to}")]
  KindChanged {
    node_id: String,
    from: &'static str,
    to: &'static str,
  },
}
