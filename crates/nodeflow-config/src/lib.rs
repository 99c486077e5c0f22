//! nodeflow Config
//!
//! This crate contains the serializable workflow configuration types for nodeflow.
//! These types represent workflow definitions as authored by an editor, before
//! they are validated into an executable graph.
//!
//! Configuration is loaded from JSON files (via CLI with `nodeflow run workflow <file>`).
//!
//! # Example
//!
//! ```json
//! {
//!   "workflow_id": "summarize",
//!   "name": "Summarize",
//!   "nodes": [
//!     { "node_id": "in", "type": "input", "text": "Rust ownership" },
//!     { "node_id": "gen", "type": "text_generator", "prompt": "Explain {{input}}" },
//!     { "node_id": "out", "type": "output" }
//!   ],
//!   "edges": [
//!     { "from": "in", "to": "gen" },
//!     { "from": "gen", "to": "out" }
//!   ]
//! }
//! ```

mod edge;
mod node;
mod workflow;

pub use edge::{Branch, Edge};
pub use node::{INPUT_PLACEHOLDER, JsonOperation, NodeDef, NodeKind};
pub use workflow::WorkflowDef;
