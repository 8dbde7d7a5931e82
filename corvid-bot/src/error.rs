//! Unified error types for corvid-bot.
//!
//! Each module has its own narrow error enum; everything converts into the
//! top-level [`BotError`] for startup plumbing. The conversational path never
//! surfaces these to the user directly — the engine maps provider failures to
//! an apologetic reply and the inline path swallows failures entirely.

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for corvid-bot operations.
///
/// Consolidates module-specific errors into a single type used by the
/// gateway and the binary entry point.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Configuration error.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Channel error.
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),

    /// Model provider error.
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl BotError {
    /// Create an internal error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias for corvid-bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Error type for configuration loading and validation.
///
/// Any of these is fatal at startup: the process refuses to run with a
/// missing secret or a malformed setting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    /// A variable is present but its value cannot be used.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The offending environment variable.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Create a missing-variable error.
    #[inline]
    pub fn missing(var: impl Into<String>) -> Self {
        Self::MissingVar(var.into())
    }

    /// Create an invalid-value error.
    #[inline]
    pub fn invalid(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Channel Errors
// ============================================================================

/// Error type for messaging-channel operations (outbound delivery, typing
/// indicators, file fetches, inline answers).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Failed to start the channel.
    #[error("start failed: {0}")]
    StartFailed(String),

    /// Failed to send a message.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The channel API rejected a request.
    #[error("API error: {0}")]
    Api(String),

    /// Transport-level failure talking to the channel.
    #[error("request error: {0}")]
    Request(String),
}

impl ChannelError {
    /// Create a start failed error.
    #[inline]
    pub fn start(msg: impl Into<String>) -> Self {
        Self::StartFailed(msg.into())
    }

    /// Create a send failed error.
    #[inline]
    pub fn send(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    /// Create an API error.
    #[inline]
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a request error.
    #[inline]
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

// ============================================================================
// Provider Errors
// ============================================================================

/// Error type for language-model provider calls.
///
/// Timeouts surface as [`ProviderError::Request`] (the HTTP client enforces
/// the request deadline). Degenerate-but-well-formed responses are *not*
/// errors; the response interpreter maps those to a fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider rejected the request (non-2xx status).
    #[error("API error: {0}")]
    Api(String),

    /// Transport-level failure (connect, timeout, malformed body).
    #[error("request error: {0}")]
    Request(String),
}

impl ProviderError {
    /// Create an API error.
    #[inline]
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a request error.
    #[inline]
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ============================================================================
// Error Context Extension
// ============================================================================

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<BotError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            BotError::Internal(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            BotError::Internal(format!("{}: {}", f(), err))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
