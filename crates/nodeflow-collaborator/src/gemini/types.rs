//! Wire types for the Gemini `generateContent` and Imagen `predict` endpoints.

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::types::Source;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
  pub contents: Vec<Content>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tools: Option<Vec<Tool>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
  pub fn text(prompt: &str) -> Self {
    Self {
      contents: vec![Content::user(prompt)],
      tools: None,
      generation_config: Some(GenerationConfig {
        thinking_config: ThinkingConfig { thinking_budget: 0 },
      }),
    }
  }

  pub fn search(prompt: &str) -> Self {
    Self {
      contents: vec![Content::user(prompt)],
      tools: Some(vec![Tool {
        google_search: GoogleSearch {},
      }]),
      generation_config: None,
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Content {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
  #[serde(default)]
  pub parts: Vec<Part>,
}

impl Content {
  fn user(prompt: &str) -> Self {
    Self {
      role: Some("user".to_string()),
      parts: vec![Part {
        text: Some(prompt.to_string()),
      }],
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Part {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Tool {
  pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
  pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThinkingConfig {
  pub thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
  #[serde(default)]
  pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
  pub content: Option<Content>,
  pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
  #[serde(default)]
  pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroundingChunk {
  pub web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebChunk {
  pub uri: Option<String>,
  pub title: Option<String>,
}

impl GenerateContentResponse {
  /// Concatenated text of the first candidate.
  pub fn text(&self) -> Result<String, CollaboratorError> {
    let content = self
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .ok_or_else(|| CollaboratorError::invalid_response("response has no candidates"))?;

    Ok(
      content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect(),
    )
  }

  /// Web sources of the first candidate; chunks missing a uri or title are skipped.
  pub fn sources(&self) -> Vec<Source> {
    self
      .candidates
      .first()
      .and_then(|c| c.grounding_metadata.as_ref())
      .map(|meta| {
        meta
          .grounding_chunks
          .iter()
          .filter_map(|chunk| chunk.web.as_ref())
          .filter_map(|web| match (&web.uri, &web.title) {
            (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => Some(Source {
              uri: uri.clone(),
              title: title.clone(),
            }),
            _ => None,
          })
          .collect()
      })
      .unwrap_or_default()
  }
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest {
  pub instances: Vec<PredictInstance>,
  pub parameters: PredictParameters,
}

impl PredictRequest {
  pub fn image(prompt: &str) -> Self {
    Self {
      instances: vec![PredictInstance {
        prompt: prompt.to_string(),
      }],
      parameters: PredictParameters {
        sample_count: 1,
        aspect_ratio: "1:1".to_string(),
        output_options: OutputOptions {
          mime_type: "image/jpeg".to_string(),
        },
      },
    }
  }
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictInstance {
  pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PredictParameters {
  pub sample_count: u32,
  pub aspect_ratio: String,
  pub output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OutputOptions {
  pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
  #[serde(default)]
  pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Prediction {
  pub bytes_base64_encoded: Option<String>,
  pub mime_type: Option<String>,
}

impl PredictResponse {
  /// First generated image as a `data:` URI.
  pub fn data_uri(&self) -> Result<String, CollaboratorError> {
    let prediction = self
      .predictions
      .first()
      .ok_or_else(|| CollaboratorError::invalid_response("no images were generated"))?;
    let bytes = prediction
      .bytes_base64_encoded
      .as_deref()
      .ok_or_else(|| CollaboratorError::invalid_response("generated image has no data"))?;
    let mime = prediction.mime_type.as_deref().unwrap_or("image/jpeg");

    Ok(format!("data:{mime};base64,{bytes}"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_text_request_disables_thinking() {
    let body = serde_json::to_value(GenerateContentRequest::text("hi")).unwrap();
    assert_eq!(
      body,
      json!({
        "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
        "generationConfig": { "thinkingConfig": { "thinkingBudget": 0 } }
      })
    );
  }

  #[test]
  fn test_search_request_enables_google_search() {
    let body = serde_json::to_value(GenerateContentRequest::search("rust")).unwrap();
    assert_eq!(body["tools"], json!([{ "googleSearch": {} }]));
    assert!(body.get("generationConfig").is_none());
  }

  #[test]
  fn test_response_text_joins_parts() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
      "candidates": [{
        "content": { "role": "model", "parts": [{ "text": "Hello, " }, { "text": "world" }] }
      }]
    }))
    .unwrap();

    assert_eq!(response.text().unwrap(), "Hello, world");
    assert!(response.sources().is_empty());
  }

  #[test]
  fn test_response_without_candidates_is_invalid() {
    let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
    assert!(matches!(
      response.text(),
      Err(CollaboratorError::InvalidResponse { .. })
    ));
  }

  #[test]
  fn test_sources_skip_incomplete_chunks() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
      "candidates": [{
        "content": { "parts": [{ "text": "answer" }] },
        "groundingMetadata": {
          "groundingChunks": [
            { "web": { "uri": "https://a.example", "title": "A" } },
            { "web": { "uri": "https://b.example" } },
            { "retrievedContext": {} },
            { "web": { "uri": "https://c.example", "title": "C" } }
          ]
        }
      }]
    }))
    .unwrap();

    assert_eq!(
      response.sources(),
      vec![
        Source {
          uri: "https://a.example".to_string(),
          title: "A".to_string()
        },
        Source {
          uri: "https://c.example".to_string(),
          title: "C".to_string()
        },
      ]
    );
  }

  #[test]
  fn test_predict_response_data_uri() {
    let response: PredictResponse = serde_json::from_value(json!({
      "predictions": [{ "bytesBase64Encoded": "AAAA", "mimeType": "image/jpeg" }]
    }))
    .unwrap();
    assert_eq!(response.data_uri().unwrap(), "data:image/jpeg;base64,AAAA");

    let empty: PredictResponse = serde_json::from_value(json!({ "predictions": [] })).unwrap();
    assert!(empty.data_uri().is_err());
  }
}
