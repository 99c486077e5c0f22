//! Runtime error types.

use nodeflow_collaborator::CollaboratorError;
use nodeflow_workflow::WorkflowError;

/// Errors that end a run (or reject one before it starts).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// The node/edge sets do not form a valid graph.
  #[error("malformed graph: {0}")]
  MalformedGraph(#[from] WorkflowError),

  /// The graph contains a cycle; no node was run.
  #[error("workflow has a cycle and cannot be executed: {}", path.join(" -> "))]
  CycleDetected { path: Vec<String> },

  /// A node failed; the run was aborted at that node.
  #[error("node '{node_id}' failed: {source}")]
  NodeFailed {
    node_id: String,
    #[source]
    source: NodeError,
  },

  /// Execution was cancelled.
  #[error("execution cancelled")]
  Cancelled,

  /// A run is already in progress on this runtime.
  #[error("a run is already in progress")]
  AlreadyRunning,

  /// Node configuration cannot change while a run is in progress.
  #[error("cannot configure node '{node_id}' while a run is in progress")]
  RunInProgress { node_id: String },

  /// A node edit was rejected (for example, an attempt to change its kind).
  #[error("invalid node configuration: {0}")]
  InvalidConfiguration(#[source] WorkflowError),

  #[error("node '{0}' not found in workflow")]
  NodeNotFound(String),
}

/// Failure of a single node behavior.
///
/// The `Display` form is what ends up in the node's run-state `error` field.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
  /// The collaborator reported a failure; its message is passed through as-is.
  #[error(transparent)]
  Collaborator(#[from] CollaboratorError),

  /// A JSON parse node received text that is not valid JSON.
  #[error("{message}")]
  Parse { message: String },

  /// User code failed to load, raised an error, or returned an unrepresentable value.
  #[error("{message}")]
  UserCode { message: String },

  #[error("node timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The run was cancelled while user code was still executing.
  #[error("execution cancelled")]
  Cancelled,
}

impl NodeError {
  /// Create a parse error.
  pub fn parse(message: impl Into<String>) -> Self {
    Self::Parse {
      message: message.into(),
    }
  }

  /// Create a user code error.
  pub fn user_code(message: impl Into<String>) -> Self {
    Self::UserCode {
      message: message.into(),
    }
  }
}
