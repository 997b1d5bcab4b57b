//! The client contract: one model call in, one completion out.
//!
//! The pipeline never talks to a provider directly. Every agent step builds a
//! normalized [`LlmRequest`] and hands it to a caller-supplied [`LlmClient`],
//! which performs exactly one model invocation.
//!
//! ```text
//! Agent step ──► LlmRequest ──► LlmClient::complete() ──► Completion
//!                                       │
//!                         ┌─────────────┼──────────────┐
//!                     FnClient      MockClient     OpenAiClient
//!                  (any closure)    (tests)     (feature "openai")
//! ```

pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use mock::MockClient;
#[cfg(feature = "openai")]
pub use openai::OpenAiClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author.
    pub role: Role,
    /// The message content.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// A normalized, provider-agnostic LLM request.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"llama-3.3-70b-versatile"`, `"gpt-4o"`).
    pub model: String,
    /// Ordered chat messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// Result of one successful model call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Generated text. `None` when the provider returned no content.
    pub text: Option<String>,
    /// Prompt tokens billed for the call.
    pub prompt_tokens: u64,
    /// Completion tokens billed for the call.
    pub completion_tokens: u64,
}

impl Completion {
    pub fn new(text: impl Into<String>, prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            text: Some(text.into()),
            prompt_tokens,
            completion_tokens,
        }
    }
}

/// Performs exactly one model invocation.
///
/// Implementations may fail; the pipeline captures each failure in a
/// [`CallRecord`](crate::recorder::CallRecord) instead of aborting the step.
/// Timeouts, retries and rate limiting are the implementation's concern.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn LlmClient>`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Execute one model call.
    async fn complete(&self, request: &LlmRequest) -> Result<Completion>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str {
        "client"
    }
}

/// An [`LlmClient`] backed by an async closure.
///
/// # Example
///
/// ```
/// use mixture_pipeline::client::{Completion, FnClient, LlmRequest};
///
/// let client = FnClient(|req: LlmRequest| async move {
///     let text = format!("echo from {}", req.model);
///     Ok::<_, mixture_pipeline::PipelineError>(Completion::new(text, 10, 5))
/// });
/// ```
pub struct FnClient<F>(pub F);

#[async_trait]
impl<F, Fut> LlmClient for FnClient<F>
where
    F: Fn(LlmRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Completion>> + Send + 'static,
{
    async fn complete(&self, request: &LlmRequest) -> Result<Completion> {
        (self.0)(request.clone()).await
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}
