use thiserror::Error;

/// Errors produced by the pipeline and its components.
///
/// Backend failures are normally captured per call and stored in the
/// [`History`](crate::history::History) rather than returned; this type
/// surfaces at construction time and from [`LlmClient`](crate::client::LlmClient)
/// implementations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[cfg(feature = "openai")]
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON encoding or decoding failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A single model call failed.
    #[error("Model '{model}' failed: {message}")]
    Backend { model: String, message: String },

    /// Invalid configuration detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP error with status code and response body.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 429, 500, 503).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Shorthand for a [`PipelineError::Backend`] error.
    pub fn backend(model: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Backend {
            model: model.into(),
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
