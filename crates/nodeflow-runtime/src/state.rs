//! Per-node run-state and the reporter that owns it.
//!
//! Run-state lives in a side table keyed by node id, separate from the
//! workflow definition. The scheduler never writes to it directly: every
//! change goes through [`StateReporter::update`], which merges a
//! [`NodeStatePatch`] into the stored state and notifies observers.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use nodeflow_collaborator::Source;
use serde::{Deserialize, Serialize};

use crate::events::{ExecutionEvent, ExecutionNotifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  #[default]
  Idle,
  Running,
  Success,
  Error,
}

/// Observable outcome of a node in the current (or last) run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRunState {
  pub status: NodeStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution_time_ms: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token_count: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sources: Option<Vec<Source>>,
}

impl NodeRunState {
  /// Merge a patch; fields the patch leaves unset are preserved.
  pub fn apply(&mut self, patch: NodeStatePatch) {
    if let Some(status) = patch.status {
      self.status = status;
    }
    if patch.result.is_some() {
      self.result = patch.result;
    }
    if patch.error.is_some() {
      self.error = patch.error;
    }
    if patch.execution_time_ms.is_some() {
      self.execution_time_ms = patch.execution_time_ms;
    }
    if patch.token_count.is_some() {
      self.token_count = patch.token_count;
    }
    if patch.sources.is_some() {
      self.sources = patch.sources;
    }
  }
}

/// A partial run-state update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStatePatch {
  pub status: Option<NodeStatus>,
  pub result: Option<serde_json::Value>,
  pub error: Option<String>,
  pub execution_time_ms: Option<u64>,
  pub token_count: Option<u64>,
  pub sources: Option<Vec<Source>>,
}

impl NodeStatePatch {
  pub fn status(status: NodeStatus) -> Self {
    Self {
      status: Some(status),
      ..Self::default()
    }
  }

  pub fn running() -> Self {
    Self::status(NodeStatus::Running)
  }

  /// Success with the given result and elapsed time.
  pub fn success(result: Option<serde_json::Value>, execution_time_ms: u64) -> Self {
    Self {
      status: Some(NodeStatus::Success),
      result,
      execution_time_ms: Some(execution_time_ms),
      ..Self::default()
    }
  }

  pub fn failure(error: impl Into<String>, execution_time_ms: u64) -> Self {
    Self {
      status: Some(NodeStatus::Error),
      error: Some(error.into()),
      execution_time_ms: Some(execution_time_ms),
      ..Self::default()
    }
  }

  pub fn sources(sources: Vec<Source>) -> Self {
    Self {
      sources: Some(sources),
      ..Self::default()
    }
  }

  pub fn with_token_count(mut self, token_count: Option<u64>) -> Self {
    self.token_count = token_count;
    self
  }
}

/// Owner of the run-state table.
pub struct StateReporter<N: ExecutionNotifier> {
  states: RwLock<HashMap<String, NodeRunState>>,
  execution_id: RwLock<String>,
  notifier: N,
}

impl<N: ExecutionNotifier> StateReporter<N> {
  pub fn new(notifier: N) -> Self {
    Self {
      states: RwLock::new(HashMap::new()),
      execution_id: RwLock::new(String::new()),
      notifier,
    }
  }

  pub fn notifier(&self) -> &N {
    &self.notifier
  }

  /// Reset every listed node to Idle and clear all other fields.
  ///
  /// Entries for nodes not listed are dropped.
  pub fn reset<'a>(&self, execution_id: &str, node_ids: impl IntoIterator<Item = &'a String>) {
    *self
      .execution_id
      .write()
      .unwrap_or_else(PoisonError::into_inner) = execution_id.to_string();

    let fresh: HashMap<String, NodeRunState> = node_ids
      .into_iter()
      .map(|id| (id.clone(), NodeRunState::default()))
      .collect();

    let mut ids: Vec<String> = fresh.keys().cloned().collect();
    ids.sort();

    *self.states.write().unwrap_or_else(PoisonError::into_inner) = fresh;

    for node_id in ids {
      self.notifier.notify(ExecutionEvent::NodeStateChanged {
        execution_id: execution_id.to_string(),
        node_id,
        state: NodeRunState::default(),
      });
    }
  }

  /// Merge `patch` into the state of `node_id` and notify observers.
  ///
  /// Unknown node ids get a fresh entry.
  pub fn update(&self, node_id: &str, patch: NodeStatePatch) {
    let state = {
      let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
      let entry = states.entry(node_id.to_string()).or_default();
      entry.apply(patch);
      entry.clone()
    };

    let execution_id = self
      .execution_id
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone();

    self.notifier.notify(ExecutionEvent::NodeStateChanged {
      execution_id,
      node_id: node_id.to_string(),
      state,
    });
  }

  pub fn get(&self, node_id: &str) -> Option<NodeRunState> {
    self
      .states
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(node_id)
      .cloned()
  }

  /// Copy of the whole table.
  pub fn snapshot(&self) -> HashMap<String, NodeRunState> {
    self
      .states
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}
