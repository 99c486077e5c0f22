//! nodeflow Runtime
//!
//! This crate executes nodeflow workflows. [`Runtime`] schedules nodes in
//! dependency order, computes each node's input from its predecessors,
//! dispatches to the node's behavior through the [`BehaviorRegistry`], prunes
//! untaken Decision branches and records every status transition in a
//! run-state table observable through an [`ExecutionNotifier`].

mod code;
mod decision;
mod error;
mod events;
mod input;
mod registry;
mod result;
mod runtime;
mod state;

pub use code::CodeRunner;
pub use decision::{Evaluation, evaluate};
pub use error::{NodeError, RuntimeError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use input::{MERGE_SEPARATOR, join_inputs, stringify, substitute_input};
pub use registry::{BehaviorRegistry, Invocation, transform_json};
pub use result::RunReport;
pub use runtime::{Runtime, RuntimeConfig};
pub use state::{NodeRunState, NodeStatePatch, NodeStatus, StateReporter};
