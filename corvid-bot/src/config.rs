//! Runtime configuration loaded from the environment.
//!
//! Two secrets are required and checked once at startup: the Telegram bot
//! token and the OpenAI API key. Everything else has a default and an
//! optional `CORVID_*` override. There is no configuration file — session
//! state is memory-only and so is configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

// ============================================================================
// Defaults
// ============================================================================

/// Default system persona applied to new sessions and inline queries.
pub const DEFAULT_PERSONA: &str =
    "You are a helpful AI assistant in Telegram. Be concise and friendly.";

/// Default model requested from the provider.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Default maximum number of retained history turns per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 80;

/// Default cap on generated tokens per reply.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;

/// Default provider request deadline in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
const ENV_ALLOWED_USERS: &str = "CORVID_ALLOWED_USERS";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
const ENV_MODEL: &str = "CORVID_MODEL";
const ENV_PERSONA: &str = "CORVID_PERSONA";
const ENV_HISTORY_LIMIT: &str = "CORVID_HISTORY_LIMIT";
const ENV_MAX_OUTPUT_TOKENS: &str = "CORVID_MAX_OUTPUT_TOKENS";
const ENV_REQUEST_TIMEOUT_SECS: &str = "CORVID_REQUEST_TIMEOUT_SECS";

// ============================================================================
// Config Types
// ============================================================================

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub token: String,
    /// User IDs allowed to talk to the bot. Empty means allow everyone.
    pub allowed_users: Vec<i64>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

/// OpenAI provider configuration.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key for the provider.
    pub api_key: String,
    /// Base URL of the API, without a trailing slash.
    pub base_url: Option<String>,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Conversation behavior configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model requested for every session and for inline queries.
    pub model: String,
    /// Default persona seeded into new sessions.
    pub persona: String,
    /// Maximum retained history turns per session (FIFO trim beyond this).
    pub history_limit: usize,
    /// Cap on generated tokens per reply.
    pub max_output_tokens: u32,
    /// Provider request deadline in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            persona: DEFAULT_PERSONA.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Complete bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram channel settings.
    pub telegram: TelegramConfig,
    /// Provider settings.
    pub openai: OpenAiConfig,
    /// Conversation settings.
    pub chat: ChatConfig,
}

impl BotConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when either required secret is
    /// absent or empty, and [`ConfigError::Invalid`] when an override fails
    /// to parse or is out of range.
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(|name| std::env::var(name).ok())
    }

    /// Load configuration through an injected variable lookup.
    ///
    /// Factored out of [`Self::from_env`] so tests can drive it without
    /// mutating process-wide environment state.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::from_env`].
    pub fn load<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = required(&lookup, ENV_TELEGRAM_TOKEN)?;
        let allowed_users = id_list(&lookup, ENV_ALLOWED_USERS)?;
        let api_key = required(&lookup, ENV_OPENAI_API_KEY)?;

        let history_limit: usize = parsed(&lookup, ENV_HISTORY_LIMIT, DEFAULT_HISTORY_LIMIT)?;
        if history_limit < 2 {
            return Err(ConfigError::invalid(
                ENV_HISTORY_LIMIT,
                "must be at least 2 (one user/assistant pair)",
            ));
        }

        let max_output_tokens: u32 =
            parsed(&lookup, ENV_MAX_OUTPUT_TOKENS, DEFAULT_MAX_OUTPUT_TOKENS)?;
        if max_output_tokens == 0 {
            return Err(ConfigError::invalid(ENV_MAX_OUTPUT_TOKENS, "must be positive"));
        }

        let request_timeout_secs: u64 = parsed(
            &lookup,
            ENV_REQUEST_TIMEOUT_SECS,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::invalid(ENV_REQUEST_TIMEOUT_SECS, "must be positive"));
        }

        Ok(Self {
            telegram: TelegramConfig {
                token,
                allowed_users,
            },
            openai: OpenAiConfig {
                api_key,
                base_url: optional(&lookup, ENV_OPENAI_BASE_URL),
            },
            chat: ChatConfig {
                model: optional(&lookup, ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                persona: optional(&lookup, ENV_PERSONA)
                    .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
                history_limit,
                max_output_tokens,
                request_timeout_secs,
            },
        })
    }

    /// Human-readable summary with secrets redacted, for `corvid check`.
    #[must_use]
    pub fn summary(&self) -> String {
        let allowed = if self.telegram.allowed_users.is_empty() {
            "everyone".to_string()
        } else {
            format!("{} user(s)", self.telegram.allowed_users.len())
        };

        format!(
            "telegram token: [set]\n\
             allowed users: {allowed}\n\
             openai api key: [set]\n\
             openai base url: {}\n\
             model: {}\n\
             history limit: {} turns\n\
             max output tokens: {}\n\
             request timeout: {}s\n\
             persona: {}",
            self.openai.base_url.as_deref().unwrap_or("(default)"),
            self.chat.model,
            self.chat.history_limit,
            self.chat.max_output_tokens,
            self.chat.request_timeout_secs,
            self.chat.persona,
        )
    }
}

// ============================================================================
// Lookup Helpers
// ============================================================================

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, name: &str) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or_else(|| ConfigError::missing(name))
}

fn parsed<F, T>(lookup: &F, name: &str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match optional(lookup, name) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, e.to_string())),
        None => Ok(default),
    }
}

/// Parse a comma-separated list of numeric user IDs.
fn id_list<F>(lookup: &F, name: &str) -> ConfigResult<Vec<i64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = optional(lookup, name) else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse()
                .map_err(|_| ConfigError::invalid(name, format!("not a user id: {entry:?}")))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
