use serde::{Deserialize, Serialize};

/// Output of a text generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGeneration {
  pub text: String,
  pub token_count: u64,
}

/// A web page cited by a search-grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub uri: String,
  pub title: String,
}

/// Output of a web search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
  pub text: String,
  pub sources: Vec<Source>,
  pub token_count: u64,
}

/// Rough token estimate: one token per four characters, rounded.
pub fn estimate_tokens(text: &str) -> u64 {
  (text.chars().count() as f64 / 4.0).round() as u64
}
