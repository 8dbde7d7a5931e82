//! Corvid - a personal Telegram assistant backed by the OpenAI Responses API.
//!
//! This crate provides a single-purpose chat bot: each Telegram user gets an
//! isolated conversation session with bounded history, control commands for
//! resetting and repersonalizing it, photo understanding, and a stateless
//! inline-query mode.
//!
//! # Architecture
//!
//! The bot is organized around these core components:
//!
//! - **Events** ([`events`]) - Decoded inbound updates: text, photos, commands, inline queries
//! - **Session** ([`session`]) - Per-user conversation state and the concurrent store
//! - **Agent** ([`agent`]) - Prompt assembly, command dispatch, and the event engine
//! - **Provider** ([`provider`]) - Responses API client behind the [`provider::CompletionModel`] trait
//! - **Channels** ([`channels`]) - The Telegram transport
//! - **Gateway** ([`gateway`]) - Unified orchestration of all components
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use corvid_bot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = BotConfig::from_env()?;
//!     let model = OpenAiClient::builder()
//!         .api_key(&config.openai.api_key)
//!         .build();
//!     Gateway::builder().config(config).model(model).build().run().await
//! }
//! ```
//!
//! # Features
//!
//! - `telegram` - Enable the Telegram transport via teloxide (default)

pub mod agent;
pub mod channel;
pub mod channels;
pub mod config;
pub mod error;
pub mod events;
#[cfg(feature = "telegram")]
pub mod gateway;
pub mod provider;
pub mod session;
pub mod util;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error types (centralized)
    pub use crate::error::{
        BotError, ChannelError, ChannelResult, ConfigError, ConfigResult, ErrorContext,
        ProviderError, ProviderResult, Result,
    };

    // Agent
    pub use crate::agent::{BotEngine, CommandReply, PromptBuilder};

    // Channel
    pub use crate::channel::{InlineAnswer, Messenger, ReplyFormat};
    #[cfg(feature = "telegram")]
    pub use crate::channels::{TelegramChannel, TelegramChannelConfig};

    // Config
    pub use crate::config::{BotConfig, ChatConfig, OpenAiConfig, TelegramConfig};

    // Events
    pub use crate::events::{ChatCommand, ChatEvent, EventKind, ImageRef, InlineQuery, UserId};

    // Gateway
    #[cfg(feature = "telegram")]
    pub use crate::gateway::{Gateway, GatewayBuilder};

    // Provider
    pub use crate::provider::{
        ChatPrompt, Completion, CompletionModel, OpenAiClient, OpenAiClientBuilder, TokenUsage,
    };

    // Session
    pub use crate::session::{
        SessionDefaults, SessionSettings, SessionState, SessionStore, Turn, TurnRole, UsageStats,
    };

    // Utilities
    pub use crate::util::truncate_str;
}
