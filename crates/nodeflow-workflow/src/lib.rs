//! nodeflow Workflow
//!
//! This crate provides the validated workflow representation for nodeflow.
//! A [`Workflow`] is built from a [`nodeflow_config::WorkflowDef`] and is ready
//! for execution.
//!
//! Key differences from `nodeflow-config`:
//! - Node ids are unique and every edge references a known node
//! - Node kinds are fixed; only their configuration may be edited
//! - A [`Graph`] with adjacency, reverse adjacency and in-degree indices can be
//!   derived at any time, and checked for cycles with [`has_cycle`]

mod cycle;
mod error;
mod graph;
mod node;
mod workflow;

pub use cycle::{find_cycle, has_cycle};
pub use error::WorkflowError;
pub use graph::Graph;
pub use node::Node;
pub use workflow::Workflow;

pub use nodeflow_config::{Branch, Edge, JsonOperation, NodeKind};
