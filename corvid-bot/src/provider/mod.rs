//! Completion provider abstraction.
//!
//! The engine talks to a [`CompletionModel`] and never to a concrete HTTP
//! client, so tests can script replies and failures. The one real
//! implementation is [`OpenAiClient`].

mod openai;

pub use openai::{OpenAiClient, OpenAiClientBuilder, FALLBACK_REPLY};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::error::ProviderResult;

// ============================================================================
// Prompt types
// ============================================================================

/// Role attached to a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    /// Persona instructions.
    System,
    /// The human side of the conversation.
    User,
    /// Prior model replies carried as context.
    Assistant,
}

impl PromptRole {
    /// Wire-format role string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One content block inside a prompt message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    /// Plain text.
    Text(String),
    /// JPEG image bytes, encoded for the wire by the provider client.
    Image(Vec<u8>),
}

/// One message in a prompt: a role plus ordered content blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    /// Speaker role.
    pub role: PromptRole,
    /// Content blocks, in order.
    pub parts: Vec<PromptPart>,
}

impl PromptMessage {
    /// Message with explicit parts.
    #[must_use]
    pub const fn new(role: PromptRole, parts: Vec<PromptPart>) -> Self {
        Self { role, parts }
    }

    /// Single-text message with the given role.
    pub fn text(role: PromptRole, text: impl Into<String>) -> Self {
        Self::new(role, vec![PromptPart::Text(text.into())])
    }

    /// System message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(PromptRole::System, text)
    }

    /// User message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(PromptRole::User, text)
    }

    /// Assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(PromptRole::Assistant, text)
    }
}

/// Fully assembled input for one completion call.
///
/// The model travels with the prompt so that per-session model overrides
/// take effect on every call, not just the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    /// Model identifier, e.g. `gpt-4.1-mini`.
    pub model: String,
    /// Ordered messages: system first, then history, then the live turn.
    pub messages: Vec<PromptMessage>,
}

// ============================================================================
// Completion types
// ============================================================================

/// Token accounting for a single completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub input_tokens: u32,
    /// Tokens produced in the reply.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Usage with the given counts.
    #[must_use]
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Combined input and output count.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// True when no tokens were counted, e.g. the provider omitted usage.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.input_tokens == 0 && self.output_tokens == 0
    }
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            input_tokens: self.input_tokens.saturating_add(rhs.input_tokens),
            output_tokens: self.output_tokens.saturating_add(rhs.output_tokens),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A provider reply: assistant text plus token accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Reply text, never empty (clients substitute a fallback line).
    pub text: String,
    /// Token counts, zero when the provider omitted them.
    pub usage: TokenUsage,
}

// ============================================================================
// Provider trait
// ============================================================================

/// A chat completion backend.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Run one completion over the prompt.
    async fn complete(&self, prompt: &ChatPrompt) -> ProviderResult<Completion>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_strings() {
        assert_eq!(PromptRole::System.as_str(), "system");
        assert_eq!(PromptRole::User.as_str(), "user");
        assert_eq!(PromptRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_message_constructors() {
        let msg = PromptMessage::user("hello");
        assert_eq!(msg.role, PromptRole::User);
        assert_eq!(msg.parts, vec![PromptPart::Text("hello".to_string())]);

        let msg = PromptMessage::new(
            PromptRole::User,
            vec![
                PromptPart::Text("look".to_string()),
                PromptPart::Image(vec![0xff, 0xd8]),
            ],
        );
        assert_eq!(msg.parts.len(), 2);
    }

    #[test]
    fn test_usage_total() {
        let usage = TokenUsage::new(120, 45);
        assert_eq!(usage.total(), 165);
        assert!(!usage.is_empty());
        assert!(TokenUsage::default().is_empty());
    }

    #[test]
    fn test_usage_add_saturates() {
        let a = TokenUsage::new(u32::MAX - 1, 10);
        let b = TokenUsage::new(5, 20);
        let sum = a + b;
        assert_eq!(sum.input_tokens, u32::MAX);
        assert_eq!(sum.output_tokens, 30);

        let mut acc = TokenUsage::default();
        acc += TokenUsage::new(3, 4);
        acc += TokenUsage::new(1, 1);
        assert_eq!(acc, TokenUsage::new(4, 5));
    }
}
