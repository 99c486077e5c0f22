use std::collections::HashMap;

use nodeflow_config::{Branch, Edge};

use crate::error::WorkflowError;

/// Graph structure for traversal and analysis.
///
/// Every list preserves the order nodes and edges were supplied in, so
/// traversals driven by it are deterministic.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Node ids in definition order.
  order: Vec<String>,
  /// Adjacency list: node_id -> list of downstream node_ids (one entry per edge).
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> list of upstream node_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Number of incoming edges per node.
  in_degree: HashMap<String, usize>,
  /// Labelled outgoing edges per node, in edge order.
  branches: HashMap<String, Vec<(Branch, String)>>,
}

impl Graph {
  /// Build a graph from node ids and edges.
  ///
  /// Fails if a node id repeats or an edge references a node that is not in
  /// `node_ids`.
  pub fn new<'a>(
    node_ids: impl IntoIterator<Item = &'a str>,
    edges: &[Edge],
  ) -> Result<Self, WorkflowError> {
    let mut order = Vec::new();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut in_degree: HashMap<String, usize> = HashMap::new();

    // Initialize all nodes
    for node_id in node_ids {
      if in_degree.insert(node_id.to_string(), 0).is_some() {
        return Err(WorkflowError::DuplicateNode(node_id.to_string()));
      }
      adjacency.insert(node_id.to_string(), Vec::new());
      reverse_adjacency.insert(node_id.to_string(), Vec::new());
      order.push(node_id.to_string());
    }

    let mut branches: HashMap<String, Vec<(Branch, String)>> = HashMap::new();

    for edge in edges {
      if !in_degree.contains_key(&edge.from) || !in_degree.contains_key(&edge.to) {
        return Err(WorkflowError::InvalidEdge {
          from: edge.from.clone(),
          to: edge.to.clone(),
        });
      }

      adjacency
        .entry(edge.from.clone())
        .or_default()
        .push(edge.to.clone());
      reverse_adjacency
        .entry(edge.to.clone())
        .or_default()
        .push(edge.from.clone());
      *in_degree.entry(edge.to.clone()).or_default() += 1;

      if let Some(branch) = edge.branch {
        branches
          .entry(edge.from.clone())
          .or_default()
          .push((branch, edge.to.clone()));
      }
    }

    Ok(Self {
      order,
      adjacency,
      reverse_adjacency,
      in_degree,
      branches,
    })
  }

  /// Node ids in definition order.
  pub fn node_ids(&self) -> &[String] {
    &self.order
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Get entry points (nodes with no incoming edges), in definition order.
  pub fn entry_points(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter(|id| self.in_degree(id) == 0)
      .map(String::as_str)
      .collect()
  }

  /// Get join points (nodes with more than one incoming edge), in definition order.
  pub fn join_points(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter(|id| self.in_degree(id) > 1)
      .map(String::as_str)
      .collect()
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Number of incoming edges of a node.
  pub fn in_degree(&self, node_id: &str) -> usize {
    self.in_degree.get(node_id).copied().unwrap_or(0)
  }

  /// A fresh copy of the in-degree index, for use as a live counter.
  pub fn in_degrees(&self) -> HashMap<String, usize> {
    self.in_degree.clone()
  }

  /// Target of the first edge leaving `node_id` labelled with `branch`.
  pub fn branch_target(&self, node_id: &str, branch: Branch) -> Option<&str> {
    self
      .branches
      .get(node_id)?
      .iter()
      .find(|(label, _)| *label == branch)
      .map(|(_, target)| target.as_str())
  }
}
