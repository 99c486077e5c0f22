//! Shared helpers for runtime integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nodeflow_collaborator::{
  Collaborator, CollaboratorError, Source, TextGeneration, WebSearchResult, estimate_tokens,
};
use nodeflow_runtime::{NodeRunState, NodeStatus, Runtime, RuntimeConfig};
use nodeflow_workflow::{Edge, Node, NodeKind, Workflow};

/// Deterministic in-memory collaborator.
///
/// Text generation answers `generated: <prompt>`, web search answers
/// `searched: <prompt>` with two sources, and image generation returns a
/// fixed data URI. Prompts containing the failure marker fail.
#[derive(Default)]
pub struct ScriptedCollaborator {
  delay: Option<Duration>,
  fail_marker: Option<String>,
  prompts: Mutex<Vec<String>>,
}

impl ScriptedCollaborator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sleep before answering.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  /// Fail every prompt containing `marker`.
  pub fn failing_on(mut self, marker: &str) -> Self {
    self.fail_marker = Some(marker.to_string());
    self
  }

  /// Every prompt received so far, in call order.
  pub fn prompts(&self) -> Vec<String> {
    self.prompts.lock().unwrap().clone()
  }

  async fn receive(&self, prompt: &str) -> Result<(), CollaboratorError> {
    self.prompts.lock().unwrap().push(prompt.to_string());

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    match &self.fail_marker {
      Some(marker) if prompt.contains(marker.as_str()) => {
        Err(CollaboratorError::failed(format!("refused prompt: {}", prompt)))
      }
      _ => Ok(()),
    }
  }
}

#[async_trait]
impl Collaborator for ScriptedCollaborator {
  async fn generate_text(&self, prompt: &str) -> Result<TextGeneration, CollaboratorError> {
    self.receive(prompt).await?;
    let text = format!("generated: {}", prompt);
    let token_count = estimate_tokens(&text);
    Ok(TextGeneration { text, token_count })
  }

  async fn search_web(&self, prompt: &str) -> Result<WebSearchResult, CollaboratorError> {
    self.receive(prompt).await?;
    let text = format!("searched: {}", prompt);
    let token_count = estimate_tokens(&text);
    Ok(WebSearchResult {
      text,
      sources: vec![
        Source {
          uri: "https://one.example".to_string(),
          title: "One".to_string(),
        },
        Source {
          uri: "https://two.example".to_string(),
          title: "Two".to_string(),
        },
      ],
      token_count,
    })
  }

  async fn generate_image(&self, prompt: &str) -> Result<String, CollaboratorError> {
    self.receive(prompt).await?;
    Ok("data:image/jpeg;base64,AAAA".to_string())
  }
}

pub fn input(node_id: &str, text: &str) -> Node {
  Node::new(
    node_id,
    NodeKind::Input {
      text: text.to_string(),
    },
  )
}

pub fn output(node_id: &str) -> Node {
  Node::new(node_id, NodeKind::Output)
}

pub fn text_generator(node_id: &str, prompt: &str) -> Node {
  Node::new(
    node_id,
    NodeKind::TextGenerator {
      prompt: prompt.to_string(),
    },
  )
}

pub fn decision(node_id: &str, condition: &str) -> Node {
  Node::new(
    node_id,
    NodeKind::Decision {
      condition: condition.to_string(),
    },
  )
}

pub fn code(node_id: &str, body: &str) -> Node {
  Node::new(
    node_id,
    NodeKind::Code {
      code: body.to_string(),
    },
  )
}

pub fn workflow(nodes: Vec<Node>, edges: Vec<Edge>) -> Workflow {
  Workflow::new("test-workflow", "Test Workflow", nodes, edges).expect("valid workflow")
}

pub fn runtime(workflow: Workflow) -> Runtime {
  Runtime::new(
    workflow,
    Arc::new(ScriptedCollaborator::new()),
    RuntimeConfig::default(),
  )
}

pub fn runtime_with(workflow: Workflow, collaborator: Arc<ScriptedCollaborator>) -> Runtime {
  Runtime::new(workflow, collaborator, RuntimeConfig::default())
}

pub fn state(runtime: &Runtime, node_id: &str) -> NodeRunState {
  runtime
    .node_state(node_id)
    .unwrap_or_else(|| panic!("no run-state for node '{}'", node_id))
}

pub fn status(runtime: &Runtime, node_id: &str) -> NodeStatus {
  state(runtime, node_id).status
}
