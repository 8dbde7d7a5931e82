//! `OpenAI` Responses API client.
//!
//! Speaks the `/responses` endpoint: structured input blocks on the way in,
//! `output_text` fragments on the way out. Response parsing is total — any
//! well-formed JSON body yields a [`Completion`], with a fallback line when
//! no text came back and zero usage when the provider omitted counts.

use base64::{Engine, prelude::BASE64_STANDARD};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{
    ChatPrompt, Completion, CompletionModel, PromptMessage, PromptPart, PromptRole, TokenUsage,
};
use crate::config::DEFAULT_MAX_OUTPUT_TOKENS;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;

/// Default `OpenAI` API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Substituted when a response carries no reply text.
pub const FALLBACK_REPLY: &str = "I couldn't generate a reply.";

/// Client for the `OpenAI` Responses API.
///
/// Works against the official API as well as compatible proxies via a
/// custom base URL. Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: Arc<str>,
    base_url: Arc<str>,
    max_output_tokens: u32,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("max_output_tokens", &self.max_output_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client with the given API key and default settings.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> OpenAiClientBuilder {
        OpenAiClientBuilder::default()
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the `/responses` request body for a prompt.
    fn build_request_body(&self, prompt: &ChatPrompt) -> Value {
        let input: Vec<Value> = prompt.messages.iter().map(message_to_value).collect();

        json!({
            "model": prompt.model,
            "input": input,
            "max_output_tokens": self.max_output_tokens,
        })
    }
}

/// Convert one prompt message into a Responses API input item.
///
/// Assistant turns replayed as context must use `output_text` blocks;
/// system and user turns use `input_text`. Images ride along as base64
/// JPEG data URLs.
fn message_to_value(message: &PromptMessage) -> Value {
    let text_type = match message.role {
        PromptRole::Assistant => "output_text",
        PromptRole::System | PromptRole::User => "input_text",
    };

    let content: Vec<Value> = message
        .parts
        .iter()
        .map(|part| match part {
            PromptPart::Text(text) => json!({ "type": text_type, "text": text }),
            PromptPart::Image(bytes) => json!({
                "type": "input_image",
                "image_url": format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(bytes)),
            }),
        })
        .collect();

    json!({ "role": message.role.as_str(), "content": content })
}

/// Extract reply text and usage from a Responses API body.
///
/// Concatenates every `output_text` fragment across all output items, in
/// order. An empty result becomes [`FALLBACK_REPLY`]; absent usage fields
/// become zeros.
fn parse_response(json: &Value) -> Completion {
    let mut text = String::new();
    if let Some(items) = json["output"].as_array() {
        for item in items {
            if let Some(chunks) = item["content"].as_array() {
                for chunk in chunks {
                    if chunk["type"].as_str() == Some("output_text") {
                        text.push_str(chunk["text"].as_str().unwrap_or(""));
                    }
                }
            }
        }
    }

    let text = text.trim().to_string();
    let text = if text.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        text
    };

    let usage = TokenUsage::new(
        saturating_u32(json["usage"]["input_tokens"].as_u64().unwrap_or(0)),
        saturating_u32(json["usage"]["output_tokens"].as_u64().unwrap_or(0)),
    );

    Completion { text, usage }
}

/// Safely convert u64 to u32, saturating at `u32::MAX` if overflow.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
const fn saturating_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        u32::MAX
    } else {
        value as u32
    }
}

#[async_trait]
impl CompletionModel for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, prompt), fields(model = %prompt.model))]
    async fn complete(&self, prompt: &ChatPrompt) -> ProviderResult<Completion> {
        let url = format!("{}/responses", self.base_url);
        let body = self.build_request_body(prompt);

        debug!(messages = prompt.messages.len(), "sending completion request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(format!("HTTP {status}: {error_text}")));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::request(e.to_string()))?;

        let completion = parse_response(&json);
        debug!(
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "completion received"
        );
        Ok(completion)
    }
}

/// Builder for [`OpenAiClient`].
#[derive(Debug, Default)]
pub struct OpenAiClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    max_output_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

impl OpenAiClientBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL, for proxies and compatible APIs.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Cap the tokens a single reply may spend.
    #[must_use]
    pub const fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Set the request timeout in seconds.
    ///
    /// The timeout is the only bound on a completion call; when it fires,
    /// the call fails like any other transport error.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Panics
    ///
    /// Panics if the API key is not set or if the HTTP client fails to build.
    #[must_use]
    pub fn build(self) -> OpenAiClient {
        let api_key = self.api_key.expect("API key is required");
        let base_url = self
            .base_url
            .unwrap_or_else(|| OPENAI_API_BASE_URL.to_string());

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let http_client = builder.build().expect("Failed to build HTTP client");

        OpenAiClient {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            max_output_tokens: self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        OpenAiClient::builder()
            .api_key("test-key")
            .max_output_tokens(800)
            .build()
    }

    #[test]
    fn test_default_base_url() {
        let client = OpenAiClient::new("test-key");
        assert_eq!(client.base_url(), OPENAI_API_BASE_URL);
    }

    #[test]
    fn test_builder_overrides() {
        let client = OpenAiClient::builder()
            .api_key("test-key")
            .base_url("https://proxy.local/v1")
            .timeout_secs(30)
            .build();

        assert_eq!(client.base_url(), "https://proxy.local/v1");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", client());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("test-key"));
    }

    #[test]
    fn test_request_body_shape() {
        let prompt = ChatPrompt {
            model: "gpt-4.1-mini".to_string(),
            messages: vec![
                PromptMessage::system("be brief"),
                PromptMessage::user("hello"),
            ],
        };
        let body = client().build_request_body(&prompt);

        assert_eq!(body["model"], "gpt-4.1-mini");
        assert_eq!(body["max_output_tokens"], 800);
        assert_eq!(body["input"][0]["role"], "system");
        assert_eq!(body["input"][0]["content"][0]["type"], "input_text");
        assert_eq!(body["input"][0]["content"][0]["text"], "be brief");
        assert_eq!(body["input"][1]["role"], "user");
    }

    #[test]
    fn test_assistant_history_uses_output_text() {
        let prompt = ChatPrompt {
            model: "gpt-4.1-mini".to_string(),
            messages: vec![
                PromptMessage::user("hi"),
                PromptMessage::assistant("hello there"),
            ],
        };
        let body = client().build_request_body(&prompt);

        assert_eq!(body["input"][0]["content"][0]["type"], "input_text");
        assert_eq!(body["input"][1]["content"][0]["type"], "output_text");
    }

    #[test]
    fn test_image_part_becomes_data_url() {
        let prompt = ChatPrompt {
            model: "gpt-4.1-mini".to_string(),
            messages: vec![PromptMessage::new(
                PromptRole::User,
                vec![
                    PromptPart::Text("what is this?".to_string()),
                    PromptPart::Image(vec![0xff, 0xd8, 0xff]),
                ],
            )],
        };
        let body = client().build_request_body(&prompt);

        let blocks = body["input"][0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["type"], "input_image");
        let url = blocks[1]["image_url"].as_str().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert!(url.len() > "data:image/jpeg;base64,".len());
    }

    #[test]
    fn test_parse_concatenates_fragments_across_items() {
        let body = json!({
            "output": [
                { "content": [
                    { "type": "output_text", "text": "Hello" },
                    { "type": "output_text", "text": ", " },
                ]},
                { "content": [
                    { "type": "output_text", "text": "world" },
                ]},
            ],
            "usage": { "input_tokens": 12, "output_tokens": 4 },
        });

        let completion = parse_response(&body);
        assert_eq!(completion.text, "Hello, world");
        assert_eq!(completion.usage, TokenUsage::new(12, 4));
    }

    #[test]
    fn test_parse_skips_non_text_chunks() {
        let body = json!({
            "output": [
                { "content": [
                    { "type": "reasoning", "text": "thinking..." },
                    { "type": "output_text", "text": "answer" },
                ]},
            ],
        });

        assert_eq!(parse_response(&body).text, "answer");
    }

    #[test]
    fn test_parse_empty_output_falls_back() {
        let body = json!({ "output": [], "usage": { "input_tokens": 3, "output_tokens": 0 } });

        let completion = parse_response(&body);
        assert_eq!(completion.text, FALLBACK_REPLY);
        assert_eq!(completion.usage.input_tokens, 3);
    }

    #[test]
    fn test_parse_whitespace_only_falls_back() {
        let body = json!({
            "output": [ { "content": [ { "type": "output_text", "text": "  \n " } ] } ],
        });

        assert_eq!(parse_response(&body).text, FALLBACK_REPLY);
    }

    #[test]
    fn test_parse_missing_usage_is_zero() {
        let body = json!({
            "output": [ { "content": [ { "type": "output_text", "text": "ok" } ] } ],
        });

        let completion = parse_response(&body);
        assert!(completion.usage.is_empty());
        assert_eq!(completion.text, "ok");
    }

    #[test]
    fn test_parse_clamps_oversized_counts() {
        let body = json!({
            "output": [],
            "usage": { "input_tokens": u64::from(u32::MAX) + 10, "output_tokens": 1 },
        });

        let completion = parse_response(&body);
        assert_eq!(completion.usage.input_tokens, u32::MAX);
        assert_eq!(completion.usage.output_tokens, 1);
    }
}
