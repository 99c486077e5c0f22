use serde::{Deserialize, Serialize};

/// Token in prompt templates that is replaced by a node's computed input.
pub const INPUT_PLACEHOLDER: &str = "{{input}}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub node_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(flatten)]
  pub kind: NodeKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}

impl NodeDef {
  pub fn new(node_id: impl Into<String>, kind: NodeKind) -> Self {
    Self {
      node_id: node_id.into(),
      label: None,
      kind,
      timeout_ms: None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonOperation {
  Parse,
  Stringify,
}

/// The closed set of node behaviors, each carrying only its own configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
  /// Emits its configured text; ignores any input.
  Input { text: String },
  /// Passes its joined input through, for display.
  Output,
  /// Sends the resolved prompt to a text generation collaborator.
  TextGenerator { prompt: String },
  /// Sends the resolved prompt to a web search collaborator.
  WebSearch { prompt: String },
  /// Sends the resolved prompt to an image generation collaborator.
  ImageGenerator { prompt: String },
  /// Routes its input down the `true` or `false` branch depending on
  /// whether the input contains `condition` (case-insensitive).
  Decision { condition: String },
  /// Joins every upstream result with a visible separator.
  Merge,
  Json { operation: JsonOperation },
  /// User-authored Lua body; `input` is bound as a global.
  Code { code: String },
}

impl NodeKind {
  /// Stable snake_case name of the kind, matching the serialized `type` tag.
  pub fn name(&self) -> &'static str {
    match self {
      NodeKind::Input { .. } => "input",
      NodeKind::Output => "output",
      NodeKind::TextGenerator { .. } => "text_generator",
      NodeKind::WebSearch { .. } => "web_search",
      NodeKind::ImageGenerator { .. } => "image_generator",
      NodeKind::Decision { .. } => "decision",
      NodeKind::Merge => "merge",
      NodeKind::Json { .. } => "json",
      NodeKind::Code { .. } => "code",
    }
  }

  /// Whether `other` is the same variant, ignoring configuration.
  pub fn same_kind(&self, other: &NodeKind) -> bool {
    std::mem::discriminant(self) == std::mem::discriminant(other)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_node_def_flattens_kind_tag() {
    let node: NodeDef = serde_json::from_str(
      r#"{"node_id":"gen","label":"AI Text","type":"text_generator","prompt":"Explain {{input}}"}"#,
    )
    .unwrap();

    assert_eq!(node.node_id, "gen");
    assert_eq!(node.label.as_deref(), Some("AI Text"));
    assert_eq!(
      node.kind,
      NodeKind::TextGenerator {
        prompt: "Explain {{input}}".to_string()
      }
    );
  }

  #[test]
  fn test_unit_kinds_deserialize_from_tag_only() {
    let node: NodeDef = serde_json::from_str(r#"{"node_id":"m","type":"merge"}"#).unwrap();
    assert_eq!(node.kind, NodeKind::Merge);

    let node: NodeDef =
      serde_json::from_str(r#"{"node_id":"o","type":"output","timeout_ms":500}"#).unwrap();
    assert_eq!(node.kind, NodeKind::Output);
    assert_eq!(node.timeout_ms, Some(500));
  }

  #[test]
  fn test_json_operation() {
    let node: NodeDef =
      serde_json::from_str(r#"{"node_id":"j","type":"json","operation":"stringify"}"#).unwrap();
    assert_eq!(
      node.kind,
      NodeKind::Json {
        operation: JsonOperation::Stringify
      }
    );
  }

  #[test]
  fn test_unknown_kind_is_rejected() {
    let result: Result<NodeDef, _> = serde_json::from_str(r#"{"node_id":"x","type":"loop"}"#);
    assert!(result.is_err());
  }

  #[test]
  fn test_same_kind_ignores_configuration() {
    let a = NodeKind::Decision {
      condition: "foo".to_string(),
    };
    let b = NodeKind::Decision {
      condition: "bar".to_string(),
    };
    assert!(a.same_kind(&b));
    assert!(!a.same_kind(&NodeKind::Merge));
    assert_eq!(a.name(), "decision");
  }
}
