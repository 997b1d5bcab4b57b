//! Mock client for testing without a live LLM.
//!
//! [`MockClient`] returns pre-configured responses per model, can be scripted
//! to fail, and records every request it receives, allowing downstream
//! consumers to write deterministic tests against this crate.
//!
//! # Example
//!
//! ```
//! use mixture_pipeline::client::MockClient;
//!
//! let mock = MockClient::fixed("Hello, world!")
//!     .with_response("judge", "1, 2")
//!     .failing_model("flaky-model");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{Completion, LlmClient, LlmRequest};
use crate::error::Result;
use crate::PipelineError;

/// A test client that returns canned responses.
///
/// Responses registered for a model are returned in order and cycle back to
/// the beginning when exhausted. Models without registered responses get the
/// default response. Token counts are whitespace-separated word counts of the
/// prompt messages and the response.
#[derive(Debug, Default)]
pub struct MockClient {
    default_response: Option<String>,
    responses: HashMap<String, Vec<String>>,
    failing_models: HashSet<String>,
    failing_calls: HashSet<usize>,
    empty_models: HashSet<String>,
    delays: HashMap<String, Duration>,
    cursors: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockClient {
    /// Create a mock with no responses. Unknown models fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers every model with the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            default_response: Some(response.into()),
            ..Self::default()
        }
    }

    /// Register a response for a model (builder style, may be repeated to
    /// queue several responses).
    pub fn with_response(mut self, model: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .entry(model.into())
            .or_default()
            .push(response.into());
        self
    }

    /// Every call to `model` fails.
    pub fn failing_model(mut self, model: impl Into<String>) -> Self {
        self.failing_models.insert(model.into());
        self
    }

    /// The call with this zero-based global index fails, whatever its model.
    pub fn failing_call(mut self, index: usize) -> Self {
        self.failing_calls.insert(index);
        self
    }

    /// Calls to `model` succeed but return no content.
    pub fn empty_model(mut self, model: impl Into<String>) -> Self {
        self.empty_models.insert(model.into());
        self
    }

    /// Calls to `model` sleep for `delay` before answering.
    pub fn with_delay(mut self, model: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(model.into(), delay);
        self
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received, in arrival order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        lock(&self.requests).clone()
    }

    fn next_response(&self, model: &str) -> Option<String> {
        match self.responses.get(model) {
            Some(queue) if !queue.is_empty() => {
                let mut cursors = lock(&self.cursors);
                let cursor = cursors.entry(model.to_string()).or_insert(0);
                let text = queue[*cursor % queue.len()].clone();
                *cursor += 1;
                Some(text)
            }
            _ => self.default_response.clone(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

#[async_trait]
impl LlmClient for MockClient {
    async fn complete(&self, request: &LlmRequest) -> Result<Completion> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(delay) = self.delays.get(&request.model) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing_calls.contains(&index) || self.failing_models.contains(&request.model) {
            return Err(PipelineError::backend(
                &request.model,
                format!("mock failure on call {}", index),
            ));
        }

        let prompt_tokens = request.messages.iter().map(|m| word_count(&m.content)).sum();

        if self.empty_models.contains(&request.model) {
            return Ok(Completion {
                text: None,
                prompt_tokens,
                completion_tokens: 0,
            });
        }

        let text = self.next_response(&request.model).ok_or_else(|| {
            PipelineError::backend(&request.model, "no mock response registered")
        })?;

        Ok(Completion {
            completion_tokens: word_count(&text),
            text: Some(text),
            prompt_tokens,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    fn request(model: &str) -> LlmRequest {
        LlmRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user("what is rust")],
            temperature: 0.7,
            max_tokens: 64,
        }
    }

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockClient::fixed("Hello!");
        let resp = mock.complete(&request("any")).await.unwrap();
        assert_eq!(resp.text.as_deref(), Some("Hello!"));
        assert_eq!(resp.prompt_tokens, 3);
        assert_eq!(resp.completion_tokens, 1);
    }

    #[tokio::test]
    async fn test_mock_cycles_per_model() {
        let mock = MockClient::new()
            .with_response("a", "first")
            .with_response("a", "second")
            .with_response("b", "other");
        let r1 = mock.complete(&request("a")).await.unwrap();
        let r2 = mock.complete(&request("b")).await.unwrap();
        let r3 = mock.complete(&request("a")).await.unwrap();
        let r4 = mock.complete(&request("a")).await.unwrap();
        assert_eq!(r1.text.as_deref(), Some("first"));
        assert_eq!(r2.text.as_deref(), Some("other"));
        assert_eq!(r3.text.as_deref(), Some("second"));
        assert_eq!(r4.text.as_deref(), Some("first")); // cycles
    }

    #[tokio::test]
    async fn test_mock_unknown_model_fails_without_default() {
        let mock = MockClient::new().with_response("a", "x");
        assert!(mock.complete(&request("b")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_scripted_failures() {
        let mock = MockClient::fixed("ok").failing_call(1).failing_model("bad");
        assert!(mock.complete(&request("a")).await.is_ok());
        assert!(mock.complete(&request("a")).await.is_err());
        assert!(mock.complete(&request("a")).await.is_ok());
        assert!(mock.complete(&request("bad")).await.is_err());
        assert_eq!(mock.call_count(), 4);
        assert_eq!(mock.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_mock_empty_model() {
        let mock = MockClient::fixed("ok").empty_model("silent");
        let resp = mock.complete(&request("silent")).await.unwrap();
        assert!(resp.text.is_none());
    }
}
