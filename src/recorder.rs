//! Per-call timing and failure capture.
//!
//! [`record_call`] wraps exactly one [`LlmClient`] invocation. A failing call
//! never propagates: it comes back as a [`CallRecord`] with `error` set and
//! no text, so one bad backend cannot abort a fan-out of many.

use crate::client::{ChatMessage, LlmClient, LlmRequest};
use crate::config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One entry per model invocation.
///
/// Never carries the response text; successful text flows into the
/// candidate list instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Model identifier the call was made against.
    pub model: String,
    /// Wall time from dispatch to completion (or failure).
    #[serde(with = "secs")]
    pub time: Duration,
    /// Prompt tokens reported by the client. Zero on failure.
    pub in_tokens: u64,
    /// Completion tokens reported by the client. Zero on failure.
    pub out_tokens: u64,
    /// Failure description. `None` means the call succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallRecord {
    pub fn success(model: impl Into<String>, time: Duration, in_tokens: u64, out_tokens: u64) -> Self {
        Self {
            model: model.into(),
            time,
            in_tokens,
            out_tokens,
            error: None,
        }
    }

    pub fn failure(model: impl Into<String>, time: Duration, error: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            time,
            in_tokens: 0,
            out_tokens: 0,
            error: Some(error.into()),
        }
    }

    /// Did the call succeed?
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Invoke the client once, timing it and capturing any failure.
///
/// Returns the response text (if any) alongside the record. A completion
/// without content is recorded as a failure.
pub async fn record_call(
    client: &dyn LlmClient,
    model: &str,
    messages: Vec<ChatMessage>,
    config: &LlmConfig,
) -> (Option<String>, CallRecord) {
    let request = LlmRequest {
        model: model.to_string(),
        messages,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let started = Instant::now();
    let outcome = client.complete(&request).await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(completion) => match completion.text {
            Some(text) => {
                tracing::debug!(
                    model,
                    elapsed_ms = elapsed.as_millis() as u64,
                    in_tokens = completion.prompt_tokens,
                    out_tokens = completion.completion_tokens,
                    "model call succeeded"
                );
                let record = CallRecord::success(
                    model,
                    elapsed,
                    completion.prompt_tokens,
                    completion.completion_tokens,
                );
                (Some(text), record)
            }
            None => {
                tracing::warn!(model, "model call returned no content");
                (None, CallRecord::failure(model, elapsed, "empty response"))
            }
        },
        Err(e) => {
            tracing::warn!(model, error = %e, "model call failed");
            (None, CallRecord::failure(model, elapsed, e.to_string()))
        }
    }
}

/// Serialize a [`Duration`] as fractional seconds.
pub(crate) mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockClient;

    #[tokio::test]
    async fn test_record_success() {
        let mock = MockClient::fixed("four words of text");
        let (text, record) = record_call(
            &mock,
            "m",
            vec![ChatMessage::user("two words")],
            &LlmConfig::default(),
        )
        .await;
        assert_eq!(text.as_deref(), Some("four words of text"));
        assert!(record.ok());
        assert_eq!(record.model, "m");
        assert_eq!(record.in_tokens, 2);
        assert_eq!(record.out_tokens, 4);
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        let mock = MockClient::fixed("x").failing_model("m");
        let (text, record) =
            record_call(&mock, "m", vec![ChatMessage::user("q")], &LlmConfig::default()).await;
        assert!(text.is_none());
        assert!(!record.ok());
        assert!(record.error.unwrap().contains("mock failure"));
        assert_eq!(record.in_tokens, 0);
    }

    #[tokio::test]
    async fn test_record_empty_content_is_failure() {
        let mock = MockClient::fixed("x").empty_model("m");
        let (text, record) =
            record_call(&mock, "m", vec![ChatMessage::user("q")], &LlmConfig::default()).await;
        assert!(text.is_none());
        assert_eq!(record.error.as_deref(), Some("empty response"));
    }

    #[tokio::test]
    async fn test_record_forwards_config() {
        let mock = MockClient::fixed("x");
        let config = LlmConfig::default().with_temperature(0.2).with_max_tokens(99);
        record_call(&mock, "m", vec![ChatMessage::user("q")], &config).await;
        let req = &mock.requests()[0];
        assert_eq!(req.temperature, 0.2);
        assert_eq!(req.max_tokens, 99);
    }

    #[test]
    fn test_record_json_shape() {
        let ok = CallRecord::success("a", Duration::from_millis(1500), 10, 20);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["time"], 1.5);
        assert_eq!(json["in_tokens"], 10);
        assert!(json.get("error").is_none());

        let failed = CallRecord::failure("b", Duration::ZERO, "timeout");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "timeout");
        let back: CallRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, failed);
    }
}
