//! Gemini API client.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::types::{GenerateContentRequest, GenerateContentResponse, PredictRequest, PredictResponse};
use crate::Collaborator;
use crate::error::CollaboratorError;
use crate::types::{TextGeneration, WebSearchResult, estimate_tokens};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Configuration for [`GeminiClient`].
#[derive(Clone)]
pub struct GeminiConfig {
  /// API key. Calls fail with [`CollaboratorError::NotConfigured`] when absent.
  pub api_key: Option<String>,
  pub base_url: String,
  /// Model used for text generation and web search.
  pub text_model: String,
  pub image_model: String,
}

impl GeminiConfig {
  /// Read configuration from the environment.
  ///
  /// The key comes from `GEMINI_API_KEY`, falling back to `API_KEY`.
  /// `GEMINI_BASE_URL` overrides the endpoint.
  pub fn from_env() -> Self {
    let api_key = std::env::var("GEMINI_API_KEY")
      .or_else(|_| std::env::var("API_KEY"))
      .ok()
      .filter(|key| !key.trim().is_empty());
    let base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    Self {
      api_key,
      base_url,
      ..Self::default()
    }
  }
}

impl Default for GeminiConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: DEFAULT_BASE_URL.to_string(),
      text_model: DEFAULT_TEXT_MODEL.to_string(),
      image_model: DEFAULT_IMAGE_MODEL.to_string(),
    }
  }
}

impl std::fmt::Debug for GeminiConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GeminiConfig")
      .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
      .field("base_url", &self.base_url)
      .field("text_model", &self.text_model)
      .field("image_model", &self.image_model)
      .finish()
  }
}

/// HTTP client for the Gemini and Imagen APIs.
#[derive(Debug, Clone)]
pub struct GeminiClient {
  client: reqwest::Client,
  config: GeminiConfig,
}

impl GeminiClient {
  pub fn new(config: GeminiConfig) -> Self {
    Self {
      client: reqwest::Client::new(),
      config,
    }
  }

  /// Create a client configured from the environment.
  pub fn from_env() -> Self {
    Self::new(GeminiConfig::from_env())
  }

  /// Whether an API key is available.
  pub fn is_configured(&self) -> bool {
    self.config.api_key.is_some()
  }

  /// POST a JSON body to `{base_url}/models/{model}:{method}`.
  async fn call<Req, Resp>(&self, model: &str, method: &str, body: &Req) -> Result<Resp, CollaboratorError>
  where
    Req: Serialize + Sync,
    Resp: DeserializeOwned,
  {
    let api_key = self
      .config
      .api_key
      .as_deref()
      .ok_or(CollaboratorError::NotConfigured)?;

    let url = format!("{}/models/{}:{}", self.config.base_url, model, method);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
      "x-goog-api-key",
      HeaderValue::from_str(api_key).map_err(|e| CollaboratorError::Provider {
        status: 401,
        message: format!("invalid API key header: {}", e),
      })?,
    );

    debug!(url = %url, "calling gemini");

    let response = self
      .client
      .post(&url)
      .headers(headers)
      .json(body)
      .send()
      .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
      return Err(CollaboratorError::Provider {
        status: status.as_u16(),
        message: text,
      });
    }

    serde_json::from_str(&text).map_err(|e| {
      CollaboratorError::invalid_response(format!("failed to parse response: {}", e))
    })
  }
}

#[async_trait]
impl Collaborator for GeminiClient {
  #[instrument(name = "gemini_generate_text", skip_all)]
  async fn generate_text(&self, prompt: &str) -> Result<TextGeneration, CollaboratorError> {
    let response: GenerateContentResponse = self
      .call(
        &self.config.text_model,
        "generateContent",
        &GenerateContentRequest::text(prompt),
      )
      .await?;

    let text = response.text()?;
    let token_count = estimate_tokens(&text);
    Ok(TextGeneration { text, token_count })
  }

  #[instrument(name = "gemini_search_web", skip_all)]
  async fn search_web(&self, prompt: &str) -> Result<WebSearchResult, CollaboratorError> {
    let response: GenerateContentResponse = self
      .call(
        &self.config.text_model,
        "generateContent",
        &GenerateContentRequest::search(prompt),
      )
      .await?;

    let text = response.text()?;
    let sources = response.sources();
    let token_count = estimate_tokens(&text);
    Ok(WebSearchResult {
      text,
      sources,
      token_count,
    })
  }

  #[instrument(name = "gemini_generate_image", skip_all)]
  async fn generate_image(&self, prompt: &str) -> Result<String, CollaboratorError> {
    let response: PredictResponse = self
      .call(&self.config.image_model, "predict", &PredictRequest::image(prompt))
      .await?;

    response.data_uri()
  }
}
