//! Node behavior dispatch.

use std::sync::Arc;
use std::time::Duration;

use nodeflow_collaborator::{Collaborator, Source};
use nodeflow_workflow::{JsonOperation, Node, NodeKind};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::code::CodeRunner;
use crate::error::NodeError;
use crate::input::substitute_input;

/// What a behavior produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
  /// `None` when the behavior produced no value; the node then contributes
  /// nothing to its successors' input.
  pub output: Option<Value>,
  pub token_count: Option<u64>,
  pub sources: Option<Vec<Source>>,
}

impl Invocation {
  fn output(value: Value) -> Self {
    Self {
      output: Some(value),
      ..Self::default()
    }
  }
}

/// Maps each node kind to the capability that executes it.
#[derive(Clone)]
pub struct BehaviorRegistry {
  collaborator: Arc<dyn Collaborator>,
  code: CodeRunner,
}

impl BehaviorRegistry {
  pub fn new(collaborator: Arc<dyn Collaborator>, code: CodeRunner) -> Self {
    Self { collaborator, code }
  }

  /// Run the data behavior of `node` on `input`.
  ///
  /// Decision nodes pass their input through; routing is up to the scheduler.
  /// `timeout` and `cancel` are also handed to user code, which runs on a
  /// blocking thread and has to stop itself.
  pub async fn invoke(
    &self,
    node: &Node,
    input: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
  ) -> Result<Invocation, NodeError> {
    match &node.kind {
      NodeKind::Input { text } => Ok(Invocation::output(Value::String(text.clone()))),

      NodeKind::Output | NodeKind::Merge | NodeKind::Decision { .. } => {
        Ok(Invocation::output(Value::String(input.to_string())))
      }

      NodeKind::TextGenerator { prompt } => {
        let generation = self
          .collaborator
          .generate_text(&substitute_input(prompt, input))
          .await?;
        Ok(Invocation {
          output: Some(Value::String(generation.text)),
          token_count: Some(generation.token_count),
          sources: None,
        })
      }

      NodeKind::WebSearch { prompt } => {
        let search = self
          .collaborator
          .search_web(&substitute_input(prompt, input))
          .await?;
        Ok(Invocation {
          output: Some(Value::String(search.text)),
          token_count: Some(search.token_count),
          sources: Some(search.sources),
        })
      }

      NodeKind::ImageGenerator { prompt } => {
        let image = self
          .collaborator
          .generate_image(&substitute_input(prompt, input))
          .await?;
        Ok(Invocation::output(Value::String(image)))
      }

      NodeKind::Json { operation } => transform_json(*operation, input).map(Invocation::output),

      NodeKind::Code { code } => {
        let runner = self.code;
        let code = code.clone();
        let input = input.to_string();
        let cancel = cancel.clone();
        let output = tokio::task::spawn_blocking(move || runner.run(&code, &input, timeout, &cancel))
          .await
          .map_err(|e| NodeError::user_code(format!("code task failed: {}", e)))??;
        Ok(Invocation {
          output,
          ..Invocation::default()
        })
      }
    }
  }
}

/// Built-in JSON transform.
///
/// `stringify` always encodes the input text as a JSON string literal, even
/// when that text is itself valid JSON.
pub fn transform_json(operation: JsonOperation, input: &str) -> Result<Value, NodeError> {
  match operation {
    JsonOperation::Parse => serde_json::from_str(input).map_err(|e| NodeError::parse(e.to_string())),
    JsonOperation::Stringify => serde_json::to_string_pretty(&Value::String(input.to_string()))
      .map(Value::String)
      .map_err(|e| NodeError::parse(e.to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_object() {
    assert_eq!(
      transform_json(JsonOperation::Parse, r#"{"a": [1, 2]}"#).unwrap(),
      json!({ "a": [1, 2] })
    );
  }

  #[test]
  fn test_parse_rejects_plain_text() {
    let err = transform_json(JsonOperation::Parse, "hello").unwrap_err();
    assert!(matches!(err, NodeError::Parse { .. }));
  }

  #[test]
  fn test_parse_empty_input_fails() {
    assert!(transform_json(JsonOperation::Parse, "").is_err());
  }

  #[test]
  fn test_stringify_quotes_json_text() {
    assert_eq!(
      transform_json(JsonOperation::Stringify, r#"{"a":1}"#).unwrap(),
      json!(r#""{\"a\":1}""#)
    );
  }

  #[test]
  fn test_stringify_keeps_numeric_text_a_string() {
    assert_eq!(
      transform_json(JsonOperation::Stringify, "42").unwrap(),
      json!("\"42\"")
    );
  }

  #[test]
  fn test_stringify_escapes_newlines() {
    assert_eq!(
      transform_json(JsonOperation::Stringify, "a\nb").unwrap(),
      json!(r#""a\nb""#)
    );
  }

  #[test]
  fn test_stringify_plain_text_is_quoted() {
    assert_eq!(
      transform_json(JsonOperation::Stringify, "hello").unwrap(),
      json!("\"hello\"")
    );
  }
}
