//! Per-user session state: history, settings, usage counters.
//!
//! A session lives for the process lifetime and is never persisted. History
//! is bounded by a single FIFO cap enforced on every append.

use serde::{Deserialize, Serialize};

use crate::events::ImageRef;
use crate::provider::TokenUsage;

// ============================================================================
// Turns
// ============================================================================

/// Speaker role of a history turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The end user.
    User,
    /// The assistant.
    Assistant,
}

impl TurnRole {
    /// Role name as the provider expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message of a conversation. Immutable once appended.
///
/// A turn with `image_ref` set records a multimodal user input; `content`
/// then holds the caption (or the fixed default prompt). Only the handle is
/// kept — image bytes are never stored and never replayed from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke.
    pub role: TurnRole,
    /// Text content of the turn.
    pub content: String,
    /// Handle to an attached image, for user turns that carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,
}

impl Turn {
    /// Create a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            image_ref: None,
        }
    }

    /// Create a user turn that carried an image.
    #[must_use]
    pub fn user_with_image(content: impl Into<String>, image: ImageRef) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            image_ref: Some(image),
        }
    }

    /// Create an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            image_ref: None,
        }
    }
}

// ============================================================================
// Settings & Usage
// ============================================================================

/// Mutable per-session configuration, independent of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// System-level instruction shaping the assistant's behavior.
    pub persona: String,
    /// Model requested from the provider for this session.
    pub model: String,
}

/// Monotonically non-decreasing usage counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Completed exchanges (one user message answered).
    pub messages: u64,
    /// Total prompt tokens consumed.
    pub tokens_in: u64,
    /// Total completion tokens consumed.
    pub tokens_out: u64,
}

impl UsageStats {
    /// Record one successful exchange and its token usage.
    pub fn record(&mut self, usage: TokenUsage) {
        self.messages = self.messages.saturating_add(1);
        self.tokens_in = self.tokens_in.saturating_add(u64::from(usage.input_tokens));
        self.tokens_out = self
            .tokens_out
            .saturating_add(u64::from(usage.output_tokens));
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Complete mutable state tracked for one user.
///
/// The history cap is fixed at creation; [`Self::push_turn`] enforces it by
/// draining the oldest turns. Trimming is purely size-based and may orphan
/// an assistant turn from its originating user turn — accepted lossy
/// behavior.
#[derive(Debug, Clone)]
pub struct SessionState {
    history: Vec<Turn>,
    /// Persona and model for this session.
    pub settings: SessionSettings,
    /// Usage counters for this session.
    pub usage: UsageStats,
    history_limit: usize,
}

impl SessionState {
    /// Create an empty session with the given settings and history cap.
    #[must_use]
    pub const fn new(settings: SessionSettings, history_limit: usize) -> Self {
        Self {
            history: Vec::new(),
            settings,
            usage: UsageStats {
                messages: 0,
                tokens_in: 0,
                tokens_out: 0,
            },
            history_limit,
        }
    }

    /// Retained history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Append a turn, trimming the oldest entries beyond the cap.
    pub fn push_turn(&mut self, turn: Turn) {
        self.history.push(turn);
        if self.history.len() > self.history_limit {
            let trim_count = self.history.len() - self.history_limit;
            self.history.drain(0..trim_count);
        }
    }

    /// Clear the history, leaving settings and usage untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Record a completed exchange's token usage.
    pub fn record_exchange(&mut self, usage: TokenUsage) {
        self.usage.record(usage);
    }
}

// ============================================================================
// Tests
// ============================================================================
