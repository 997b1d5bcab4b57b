//! Client for OpenAI-compatible chat completion APIs.
//!
//! [`OpenAiClient`] covers OpenAI, OpenRouter, Groq, Together AI, vLLM,
//! llama.cpp server, LM Studio and Ollama's `/v1/` endpoint.
//!
//! Endpoint: `/v1/chat/completions`, non-streaming.

use super::{Completion, LlmClient, LlmRequest};
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Client for any OpenAI-compatible API.
///
/// # Example
///
/// ```
/// use mixture_pipeline::client::OpenAiClient;
///
/// let groq = OpenAiClient::new("https://api.groq.com/openai/v1").with_api_key("gsk_...");
/// ```
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    organization: Option<String>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|k| {
                    if k.chars().count() > 6 {
                        format!("{}***", k.chars().take(6).collect::<String>())
                    } else {
                        "***".to_string()
                    }
                }),
            )
            .field("organization", &self.organization)
            .finish()
    }
}

impl OpenAiClient {
    /// Create a client for the given base URL, without authentication.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base_url(&base_url.into()),
            api_key: None,
            organization: None,
        }
    }

    /// Set the API key, sent as `Authorization: Bearer {key}`.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the organization ID header.
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, connection pool).
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Build the request body for `/v1/chat/completions`.
    ///
    /// `gpt-5*` models take `max_completion_tokens`, reject custom
    /// temperatures, and need a reasoning effort.
    fn build_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
        });

        if request.model.starts_with("gpt-5") {
            body["max_completion_tokens"] = json!(request.max_tokens);
            body["reasoning_effort"] = json!("minimal");
        } else {
            body["max_tokens"] = json!(request.max_tokens);
            body["temperature"] = json!(request.temperature);
        }

        body
    }

    fn build_http_request(&self, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut req = self.http.post(url).json(body);

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        if let Some(ref org) = self.organization {
            req = req.header("OpenAI-Organization", org.as_str());
        }

        req
    }

    fn parse_completion(json_resp: &Value) -> Completion {
        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let usage = json_resp.get("usage");
        let tokens = |key: &str| {
            usage
                .and_then(|u| u.get(key))
                .and_then(|v| v.as_u64())
                .unwrap_or(0)
        };

        Completion {
            text,
            prompt_tokens: tokens("prompt_tokens"),
            completion_tokens: tokens("completion_tokens"),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &LlmRequest) -> Result<Completion> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = Self::build_body(request);

        let resp = self
            .build_http_request(&url, &body)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Other(format!("Failed to connect to LLM at {}: {}", url, e))
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError { status, body: text });
        }

        let json_resp: Value = resp.json().await?;
        Ok(Self::parse_completion(&json_resp))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Strip known provider path suffixes from a base URL so the client can
/// append `/v1/chat/completions` itself.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    for suffix in &["/v1/chat/completions", "/v1/chat", "/v1"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    fn test_request(model: &str) -> LlmRequest {
        LlmRequest {
            model: model.into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
            temperature: 0.4,
            max_tokens: 128,
        }
    }

    #[test]
    fn test_body_standard_model() {
        let body = OpenAiClient::build_body(&test_request("llama-3.3-70b-versatile"));
        assert_eq!(body["max_tokens"], 128);
        assert_eq!(body["temperature"], 0.4);
        assert!(body.get("max_completion_tokens").is_none());
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "hello");
    }

    #[test]
    fn test_body_gpt5_model() {
        let body = OpenAiClient::build_body(&test_request("gpt-5-nano"));
        assert_eq!(body["max_completion_tokens"], 128);
        assert_eq!(body["reasoning_effort"], "minimal");
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_completion_with_usage() {
        let resp = json!({
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let c = OpenAiClient::parse_completion(&resp);
        assert_eq!(c.text.as_deref(), Some("hi there"));
        assert_eq!(c.prompt_tokens, 12);
        assert_eq!(c.completion_tokens, 3);
    }

    #[test]
    fn test_parse_completion_null_content() {
        let resp = json!({"choices": [{"message": {"content": null}}]});
        let c = OpenAiClient::parse_completion(&resp);
        assert!(c.text.is_none());
        assert_eq!(c.prompt_tokens, 0);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://api.openai.com/v1/"), "https://api.openai.com");
        assert_eq!(
            normalize_base_url("https://openrouter.ai/api/v1"),
            "https://openrouter.ai/api"
        );
        assert_eq!(normalize_base_url("http://localhost:8000"), "http://localhost:8000");
    }

    #[test]
    fn test_auth_headers() {
        let client = OpenAiClient::new("https://api.openai.com")
            .with_api_key("sk-test123")
            .with_organization("org-abc");
        let req = client
            .build_http_request("https://api.openai.com/v1/chat/completions", &json!({}))
            .build()
            .expect("build request");
        assert_eq!(req.headers().get("Authorization").unwrap(), "Bearer sk-test123");
        assert_eq!(req.headers().get("OpenAI-Organization").unwrap(), "org-abc");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = OpenAiClient::new("http://x").with_api_key("sk-1234567890abcdef");
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("1234567890abcdef"));
        assert!(debug_output.contains("sk-123***"));
    }

    #[test]
    fn test_debug_redacts_non_ascii_api_key() {
        let client = OpenAiClient::new("http://x").with_api_key("ключ-секретный-123");
        let debug_output = format!("{:?}", client);
        assert!(debug_output.contains("ключ-с***"));
        assert!(!debug_output.contains("кретный"));
    }
}
