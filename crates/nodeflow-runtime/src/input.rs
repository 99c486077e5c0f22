//! Effective input computation.
//!
//! A node's input is built from the results of its predecessors, in
//! predecessor-list order. Predecessors without a result are skipped. Each
//! result is stringified (strings as-is, anything else as compact JSON) and
//! the pieces are joined: Merge nodes use [`MERGE_SEPARATOR`], every other
//! kind a single space. No predecessors gives an empty input.

use nodeflow_config::INPUT_PLACEHOLDER;
use nodeflow_workflow::NodeKind;
use serde_json::Value;

/// Separator placed between inputs of a Merge node.
pub const MERGE_SEPARATOR: &str = "\n\n---\n\n";

const DEFAULT_SEPARATOR: &str = " ";

/// Render a result value as input text.
pub fn stringify(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Join predecessor results into the input of a node of `kind`.
pub fn join_inputs<'a>(kind: &NodeKind, results: impl IntoIterator<Item = &'a Value>) -> String {
  let separator = match kind {
    NodeKind::Merge => MERGE_SEPARATOR,
    _ => DEFAULT_SEPARATOR,
  };

  results
    .into_iter()
    .map(stringify)
    .collect::<Vec<_>>()
    .join(separator)
}

/// Replace every `{{input}}` in `template` with `input`, literally.
pub fn substitute_input(template: &str, input: &str) -> String {
  template.replace(INPUT_PLACEHOLDER, input)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_merge_uses_separator() {
    let values = [json!("A"), json!("B")];
    assert_eq!(join_inputs(&NodeKind::Merge, &values), "A\n\n---\n\nB");
  }

  #[test]
  fn test_other_kinds_join_with_space() {
    let values = [json!("A"), json!({"k": 1}), json!(2)];
    assert_eq!(join_inputs(&NodeKind::Output, &values), r#"A {"k":1} 2"#);
  }

  #[test]
  fn test_no_predecessors_is_empty() {
    assert_eq!(join_inputs(&NodeKind::Output, &[]), "");
    assert_eq!(join_inputs(&NodeKind::Merge, &[]), "");
  }

  #[test]
  fn test_substitute_replaces_every_occurrence() {
    assert_eq!(
      substitute_input("{{input}} and {{input}}", "x"),
      "x and x"
    );
  }

  #[test]
  fn test_substitute_is_literal() {
    // Template-like syntax in the input is not expanded again.
    assert_eq!(substitute_input("say {{input}}", "{{input}} $1"), "say {{input}} $1");
    assert_eq!(substitute_input("{{ input }}", "x"), "{{ input }}");
  }
}
