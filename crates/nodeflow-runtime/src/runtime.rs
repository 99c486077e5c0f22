//! Workflow runtime.
//!
//! The [`Runtime`] owns a workflow, the behavior registry and the run-state
//! table, and provides `run(cancel)` to execute the full graph.
//!
//! Scheduling is Kahn's algorithm over a FIFO queue, one node at a time. A
//! node is enqueued once its live in-degree reaches zero. Decision nodes only
//! release the target of the edge labelled with their outcome, so the other
//! branch (and anything reachable only through it) never runs.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use nodeflow_collaborator::Collaborator;
use nodeflow_workflow::{Branch, Node, NodeKind, Workflow, WorkflowError, find_cycle};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::code::CodeRunner;
use crate::decision;
use crate::error::{NodeError, RuntimeError};
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::input::join_inputs;
use crate::registry::{BehaviorRegistry, Invocation};
use crate::result::RunReport;
use crate::state::{NodeRunState, NodeStatePatch, StateReporter};

/// Configuration for the runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
  /// Deadline for nodes that do not set their own `timeout_ms`.
  pub default_timeout_ms: Option<u64>,
  /// Memory cap, in bytes, for each Code node interpreter.
  pub code_memory_limit: Option<usize>,
}

/// What the scheduler should do after a node succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
  /// Release every successor.
  Completed,
  /// Release only the target of the edge labelled `branch`.
  BranchResolved { branch: Branch },
}

/// Clears the running flag when a run ends, including when its future is dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

/// The workflow runtime.
pub struct Runtime<N: ExecutionNotifier = NoopNotifier> {
  workflow: RwLock<Workflow>,
  registry: BehaviorRegistry,
  config: RuntimeConfig,
  reporter: StateReporter<N>,
  running: AtomicBool,
}

impl Runtime<NoopNotifier> {
  /// Create a runtime that does not emit events.
  pub fn new(workflow: Workflow, collaborator: Arc<dyn Collaborator>, config: RuntimeConfig) -> Self {
    Self::with_notifier(workflow, collaborator, config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> Runtime<N> {
  /// Create a runtime that reports events to `notifier`.
  pub fn with_notifier(
    workflow: Workflow,
    collaborator: Arc<dyn Collaborator>,
    config: RuntimeConfig,
    notifier: N,
  ) -> Self {
    let registry = BehaviorRegistry::new(collaborator, CodeRunner::new(config.code_memory_limit));

    Self {
      workflow: RwLock::new(workflow),
      registry,
      config,
      reporter: StateReporter::new(notifier),
      running: AtomicBool::new(false),
    }
  }

  /// Execute the whole workflow.
  ///
  /// Fails before running anything if the graph has a cycle. Otherwise every
  /// node's run-state is reset and nodes run in dependency order until the
  /// queue drains, or until the first node error, which aborts the run.
  pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport, RuntimeError> {
    let (_guard, workflow) = self.begin()?;
    let execution_id = uuid::Uuid::new_v4().to_string();

    info!(
      execution_id = %execution_id,
      workflow_id = %workflow.workflow_id,
      "workflow_started"
    );
    self.reporter.notifier().notify(ExecutionEvent::RunStarted {
      execution_id: execution_id.clone(),
      workflow_id: workflow.workflow_id.clone(),
    });

    let result = self.execute(&workflow, &execution_id, &cancel).await;

    match &result {
      Ok(report) => {
        info!(
          execution_id = %execution_id,
          executed = report.executed.len(),
          "workflow_completed"
        );
        self.reporter.notifier().notify(ExecutionEvent::RunCompleted {
          execution_id: execution_id.clone(),
        });
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "workflow_failed");
        self.reporter.notifier().notify(ExecutionEvent::RunFailed {
          execution_id: execution_id.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }

  /// Execute a single node in isolation.
  ///
  /// This is for debugging: the node's behavior runs on `input` as if it had
  /// been computed from predecessors. No graph traversal happens and the
  /// run-state table is left untouched. Decision nodes return their input.
  #[instrument(name = "runtime_invoke_node", skip(self, input, cancel), fields(node_id = %node_id))]
  pub async fn invoke_node(
    &self,
    node_id: &str,
    input: &str,
    cancel: CancellationToken,
  ) -> Result<Invocation, RuntimeError> {
    let node = self
      .workflow
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get_node(node_id)
      .cloned()
      .ok_or_else(|| RuntimeError::NodeNotFound(node_id.to_string()))?;

    info!(node_id = %node_id, kind = node.kind.name(), "invoke_node_started");

    let result = tokio::select! {
      result = self.invoke_with_deadline(&node, input, &cancel) => result,
      _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
    };

    match result {
      Ok(invocation) => {
        info!(node_id = %node_id, "invoke_node_completed");
        Ok(invocation)
      }
      Err(NodeError::Cancelled) => Err(RuntimeError::Cancelled),
      Err(e) => {
        error!(node_id = %node_id, error = %e, "invoke_node_failed");
        Err(RuntimeError::NodeFailed {
          node_id: node_id.to_string(),
          source: e,
        })
      }
    }
  }

  /// Replace a node's configuration.
  ///
  /// Rejected while a run is in progress, and when `kind` is a different node
  /// kind than the node already has.
  pub fn configure_node(&self, node_id: &str, kind: NodeKind) -> Result<(), RuntimeError> {
    let mut workflow = self.workflow.write().unwrap_or_else(PoisonError::into_inner);

    if self.running.load(Ordering::Acquire) {
      return Err(RuntimeError::RunInProgress {
        node_id: node_id.to_string(),
      });
    }

    workflow.configure_node(node_id, kind).map_err(|e| match e {
      WorkflowError::NodeNotFound(id) => RuntimeError::NodeNotFound(id),
      other => RuntimeError::InvalidConfiguration(other),
    })
  }

  /// Current run-state of every node.
  pub fn node_states(&self) -> HashMap<String, NodeRunState> {
    self.reporter.snapshot()
  }

  pub fn node_state(&self, node_id: &str) -> Option<NodeRunState> {
    self.reporter.get(node_id)
  }

  pub fn is_running(&self) -> bool {
    self.running.load(Ordering::Acquire)
  }

  pub fn notifier(&self) -> &N {
    self.reporter.notifier()
  }

  /// Mark the runtime as running and snapshot the workflow for this run.
  fn begin(&self) -> Result<(RunGuard<'_>, Workflow), RuntimeError> {
    // Held while flipping the flag so configure_node sees a consistent view.
    let workflow = self.workflow.read().unwrap_or_else(PoisonError::into_inner);

    if self
      .running
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return Err(RuntimeError::AlreadyRunning);
    }

    Ok((RunGuard(&self.running), workflow.clone()))
  }

  /// Run the main execution loop.
  #[instrument(
    name = "runtime_run",
    skip(self, workflow, cancel),
    fields(workflow_id = %workflow.workflow_id)
  )]
  async fn execute(
    &self,
    workflow: &Workflow,
    execution_id: &str,
    cancel: &CancellationToken,
  ) -> Result<RunReport, RuntimeError> {
    let graph = workflow.graph()?;

    if let Some(path) = find_cycle(&graph) {
      return Err(RuntimeError::CycleDetected { path });
    }

    debug!(
      execution_id = %execution_id,
      entry_points = ?graph.entry_points(),
      join_points = ?graph.join_points(),
      "graph_ready"
    );
    self.reporter.reset(execution_id, graph.node_ids());

    let mut in_degree = graph.in_degrees();
    let mut queue: VecDeque<String> = graph
      .entry_points()
      .into_iter()
      .map(str::to_string)
      .collect();
    let mut results: HashMap<String, Value> = HashMap::new();
    let mut executed = Vec::with_capacity(graph.len());

    loop {
      if cancel.is_cancelled() {
        warn!(execution_id = %execution_id, "workflow cancelled");
        return Err(RuntimeError::Cancelled);
      }

      let Some(node_id) = queue.pop_front() else {
        break;
      };

      let node = workflow
        .get_node(&node_id)
        .ok_or_else(|| RuntimeError::NodeNotFound(node_id.clone()))?;

      let input = join_inputs(
        &node.kind,
        graph
          .upstream(&node_id)
          .iter()
          .filter_map(|id| results.get(id)),
      );

      let outcome = self
        .step(node, &input, &mut results, execution_id, cancel)
        .await?;
      executed.push(node_id.clone());

      match outcome {
        StepOutcome::Completed => {
          for next in graph.downstream(&node_id) {
            release(&mut in_degree, &mut queue, next);
          }
        }
        StepOutcome::BranchResolved { branch } => match graph.branch_target(&node_id, branch) {
          Some(target) => {
            info!(
              execution_id = %execution_id,
              node_id = %node_id,
              branch = %branch,
              target = %target,
              "branch_resolved"
            );
            release(&mut in_degree, &mut queue, target);
          }
          None => {
            debug!(node_id = %node_id, branch = %branch, "no edge for branch");
          }
        },
      }
    }

    Ok(RunReport {
      execution_id: execution_id.to_string(),
      executed,
      results,
    })
  }

  /// Run one node and record its run-state.
  async fn step(
    &self,
    node: &Node,
    input: &str,
    results: &mut HashMap<String, Value>,
    execution_id: &str,
    cancel: &CancellationToken,
  ) -> Result<StepOutcome, RuntimeError> {
    let node_id = node.node_id.as_str();

    info!(
      execution_id = %execution_id,
      node_id = %node_id,
      kind = node.kind.name(),
      "task_started"
    );
    self.reporter.update(node_id, NodeStatePatch::running());
    let start = Instant::now();

    let result = tokio::select! {
      result = self.invoke_with_deadline(node, input, cancel) => result,
      _ = cancel.cancelled() => {
        warn!(execution_id = %execution_id, node_id = %node_id, "workflow cancelled during task execution");
        self.reporter.update(
          node_id,
          NodeStatePatch::failure(RuntimeError::Cancelled.to_string(), elapsed_ms(start)),
        );
        return Err(RuntimeError::Cancelled);
      }
    };
    let elapsed = elapsed_ms(start);

    let invocation = match result {
      Ok(invocation) => invocation,
      Err(NodeError::Cancelled) => {
        warn!(execution_id = %execution_id, node_id = %node_id, "workflow cancelled during task execution");
        self
          .reporter
          .update(node_id, NodeStatePatch::failure(RuntimeError::Cancelled.to_string(), elapsed));
        return Err(RuntimeError::Cancelled);
      }
      Err(e) => {
        error!(execution_id = %execution_id, node_id = %node_id, error = %e, "task_failed");
        self
          .reporter
          .update(node_id, NodeStatePatch::failure(e.to_string(), elapsed));
        return Err(RuntimeError::NodeFailed {
          node_id: node_id.to_string(),
          source: e,
        });
      }
    };

    if let Some(sources) = invocation.sources {
      self.reporter.update(node_id, NodeStatePatch::sources(sources));
    }

    let outcome = match &node.kind {
      NodeKind::Decision { condition } => {
        let evaluation = decision::evaluate(condition, input);
        if let Some(output) = invocation.output {
          results.insert(node_id.to_string(), output);
        }
        self.reporter.update(
          node_id,
          NodeStatePatch::success(Some(Value::String(evaluation.summary)), elapsed),
        );
        StepOutcome::BranchResolved {
          branch: evaluation.branch,
        }
      }
      _ => {
        if let Some(output) = &invocation.output {
          results.insert(node_id.to_string(), output.clone());
        }
        self.reporter.update(
          node_id,
          NodeStatePatch::success(invocation.output, elapsed).with_token_count(invocation.token_count),
        );
        StepOutcome::Completed
      }
    };

    info!(
      execution_id = %execution_id,
      node_id = %node_id,
      elapsed_ms = elapsed,
      "task_completed"
    );

    Ok(outcome)
  }

  /// Invoke a node's behavior, bounded by its deadline if it has one.
  async fn invoke_with_deadline(
    &self,
    node: &Node,
    input: &str,
    cancel: &CancellationToken,
  ) -> Result<Invocation, NodeError> {
    let timeout_ms = node.timeout_ms.or(self.config.default_timeout_ms);
    let timeout = timeout_ms.map(Duration::from_millis);
    let invocation = self.registry.invoke(node, input, timeout, cancel);

    match (timeout, timeout_ms) {
      (Some(timeout), Some(timeout_ms)) => tokio::time::timeout(timeout, invocation)
        .await
        .map_err(|_| NodeError::Timeout { timeout_ms })?,
      _ => invocation.await,
    }
  }
}

/// Decrement a node's live in-degree, enqueueing it when it reaches zero.
fn release(in_degree: &mut HashMap<String, usize>, queue: &mut VecDeque<String>, node_id: &str) {
  let Some(count) = in_degree.get_mut(node_id) else {
    return;
  };
  if *count == 0 {
    return;
  }

  *count -= 1;
  if *count == 0 {
    queue.push_back(node_id.to_string());
  }
}

fn elapsed_ms(start: Instant) -> u64 {
  start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_release_enqueues_at_zero() {
    let mut in_degree = HashMap::from([("b".to_string(), 2)]);
    let mut queue = VecDeque::new();

    release(&mut in_degree, &mut queue, "b");
    assert!(queue.is_empty());

    release(&mut in_degree, &mut queue, "b");
    assert_eq!(queue, ["b"]);
  }

  #[test]
  fn test_release_never_enqueues_twice() {
    let mut in_degree = HashMap::from([("b".to_string(), 1)]);
    let mut queue = VecDeque::new();

    release(&mut in_degree, &mut queue, "b");
    release(&mut in_degree, &mut queue, "b");
    release(&mut in_degree, &mut queue, "unknown");
    assert_eq!(queue.len(), 1);
  }
}
