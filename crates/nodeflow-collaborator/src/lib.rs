//! External capabilities invoked by nodeflow nodes.
//!
//! The runtime never talks to a model provider directly. Text generation, web
//! search and image generation nodes go through the [`Collaborator`] trait, so
//! the provider can be swapped (or scripted in tests) without touching the
//! scheduler.
//!
//! [`GeminiClient`] is the bundled implementation backed by Google's Gemini and
//! Imagen HTTP APIs.

mod error;
mod gemini;
mod types;

use async_trait::async_trait;

pub use error::CollaboratorError;
pub use gemini::{GeminiClient, GeminiConfig};
pub use types::{Source, TextGeneration, WebSearchResult, estimate_tokens};

/// A provider of the capabilities nodes delegate to.
///
/// Errors are opaque to the runtime: whatever message the implementation
/// produces is shown on the failing node.
#[async_trait]
pub trait Collaborator: Send + Sync {
  /// Generate text for a fully resolved prompt.
  async fn generate_text(&self, prompt: &str) -> Result<TextGeneration, CollaboratorError>;

  /// Answer a prompt using web search, returning the cited sources.
  async fn search_web(&self, prompt: &str) -> Result<WebSearchResult, CollaboratorError>;

  /// Generate an image and return a reference to it (a `data:` URI).
  async fn generate_image(&self, prompt: &str) -> Result<String, CollaboratorError>;
}
