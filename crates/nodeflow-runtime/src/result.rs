//! Execution result types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
  /// Unique execution ID.
  pub execution_id: String,
  /// Nodes in the order they were dequeued and executed.
  pub executed: Vec<String>,
  /// Results table, keyed by node_id. Nodes that produced no value (and
  /// nodes that never ran) are absent.
  pub results: HashMap<String, serde_json::Value>,
}
