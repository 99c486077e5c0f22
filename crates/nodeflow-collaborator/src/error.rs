use thiserror::Error;

/// Errors returned by a [`Collaborator`](crate::Collaborator).
#[derive(Debug, Error)]
pub enum CollaboratorError {
  /// No API key was supplied to the provider.
  #[error("API Key is not configured.")]
  NotConfigured,

  /// Transport failure talking to the provider.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Provider answered with a non-success status (auth, quota, bad request).
  #[error("provider returned {status}: {message}")]
  Provider { status: u16, message: String },

  /// Provider answered, but not with something we understand.
  #[error("invalid response: {message}")]
  InvalidResponse { message: String },

  /// Any other failure reported by a collaborator implementation.
  #[error("{message}")]
  Failed { message: String },
}

impl CollaboratorError {
  /// Create an invalid response error.
  pub fn invalid_response(message: impl Into<String>) -> Self {
    Self::InvalidResponse {
      message: message.into(),
    }
  }

  /// Create a generic failure.
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }
}
