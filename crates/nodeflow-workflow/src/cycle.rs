//! Cycle detection over a [`Graph`].
//!
//! Depth-first search with white/gray/black colouring. Gray nodes are on the
//! current path; reaching a gray node again is a back edge, i.e. a cycle.
//! The search is iterative so deep graphs cannot overflow the stack.

use std::collections::HashMap;

use crate::graph::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
  White,
  Gray,
  Black,
}

/// Whether the graph contains a directed cycle.
pub fn has_cycle(graph: &Graph) -> bool {
  find_cycle(graph).is_some()
}

/// Find a directed cycle, returned as the path of node ids that closes it
/// (the first id is repeated at the end).
///
/// Each node is used as a DFS root at most once, so the whole search is
/// O(|V| + |E|).
pub fn find_cycle(graph: &Graph) -> Option<Vec<String>> {
  let mut color: HashMap<&str, Color> = graph
    .node_ids()
    .iter()
    .map(|id| (id.as_str(), Color::White))
    .collect();

  for root in graph.node_ids() {
    if color.get(root.as_str()) != Some(&Color::White) {
      continue;
    }

    // (node, index of the next neighbor to visit)
    let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
    color.insert(root.as_str(), Color::Gray);

    while let Some(&(node, next)) = stack.last() {
      let neighbors = graph.downstream(node);

      let Some(neighbor) = neighbors.get(next) else {
        color.insert(node, Color::Black);
        stack.pop();
        continue;
      };

      if let Some(top) = stack.last_mut() {
        top.1 += 1;
      }

      match color.get(neighbor.as_str()) {
        Some(Color::White) => {
          color.insert(neighbor.as_str(), Color::Gray);
          stack.push((neighbor.as_str(), 0));
        }
        Some(Color::Gray) => {
          let start = stack
            .iter()
            .position(|(id, _)| *id == neighbor.as_str())
            .unwrap_or(0);
          let mut path: Vec<String> = stack[start..]
            .iter()
            .map(|(id, _)| id.to_string())
            .collect();
          path.push(neighbor.clone());
          return Some(path);
        }
        _ => {}
      }
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use nodeflow_config::Edge;

  fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
    let edges: Vec<Edge> = edges.iter().map(|(a, b)| Edge::new(*a, *b)).collect();
    Graph::new(nodes.iter().copied(), &edges).unwrap()
  }

  #[test]
  fn test_linear_graph_is_acyclic() {
    let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    assert!(!has_cycle(&g));
  }

  #[test]
  fn test_diamond_is_acyclic() {
    let g = graph(
      &["a", "b", "c", "d"],
      &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
    );
    assert!(!has_cycle(&g));
  }

  #[test]
  fn test_detects_cycle_and_reports_path() {
    let g = graph(
      &["start", "a", "b", "c"],
      &[("start", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
    );
    assert_eq!(
      find_cycle(&g),
      Some(vec![
        "a".to_string(),
        "b".to_string(),
        "c".to_string(),
        "a".to_string()
      ])
    );
  }

  #[test]
  fn test_detects_self_loop() {
    let g = graph(&["a"], &[("a", "a")]);
    assert_eq!(find_cycle(&g), Some(vec!["a".to_string(), "a".to_string()]));
  }

  #[test]
  fn test_detects_cycle_with_no_entry_points() {
    let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
    assert!(has_cycle(&g));
  }

  #[test]
  fn test_cycle_in_disconnected_component() {
    let g = graph(
      &["a", "b", "x", "y"],
      &[("a", "b"), ("x", "y"), ("y", "x")],
    );
    assert!(has_cycle(&g));
  }

  #[test]
  fn test_shared_descendant_is_not_a_cycle() {
    // "d" is reached twice from different roots; it is black the second time.
    let g = graph(&["a", "b", "d"], &[("a", "d"), ("b", "d")]);
    assert!(!has_cycle(&g));
  }

  #[test]
  fn test_deep_chain_does_not_overflow() {
    let ids: Vec<String> = (0..50_000).map(|i| format!("n{i}")).collect();
    let edges: Vec<Edge> = ids.windows(2).map(|w| Edge::new(&w[0], &w[1])).collect();
    let g = Graph::new(ids.iter().map(String::as_str), &edges).unwrap();
    assert!(!has_cycle(&g));
  }
}
