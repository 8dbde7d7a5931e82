//! Gateway: assembles and runs the complete bot.
//!
//! The unified entry point that wires configuration into a session store,
//! a conversation engine, and the Telegram channel, then runs the channel's
//! update loop until shutdown.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::agent::BotEngine;
use crate::channels::{TelegramChannel, TelegramChannelConfig};
use crate::config::BotConfig;
use crate::error::{ErrorContext, Result};
use crate::provider::CompletionModel;
use crate::session::{SessionDefaults, SessionStore};

/// Runs the complete bot over a completion model.
pub struct Gateway<M: CompletionModel + 'static> {
    config: BotConfig,
    model: M,
}

impl<M: CompletionModel + 'static> fmt::Debug for Gateway<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<M: CompletionModel + 'static> Gateway<M> {
    /// Create a gateway from a configuration and a model.
    pub const fn new(config: BotConfig, model: M) -> Self {
        Self { config, model }
    }

    /// Start building a gateway.
    #[must_use]
    pub const fn builder() -> GatewayBuilder<M> {
        GatewayBuilder::new()
    }

    /// The configuration this gateway runs with.
    #[must_use]
    pub const fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run the bot until the channel stops.
    ///
    /// # Errors
    ///
    /// Returns an error when the Telegram channel fails to start, e.g. the
    /// token is rejected by the Bot API.
    pub async fn run(self) -> Result<()> {
        let channel_config = TelegramChannelConfig::new(&self.config.telegram.token)
            .allow_users(self.config.telegram.allowed_users.iter().copied());
        let channel = TelegramChannel::new(channel_config);

        let store = SessionStore::new(SessionDefaults::from(&self.config.chat));
        let engine = Arc::new(BotEngine::new(store, self.model, channel.messenger()));

        info!(
            model = %self.config.chat.model,
            history_limit = self.config.chat.history_limit,
            "gateway starting"
        );

        channel
            .run(engine)
            .await
            .context("running telegram channel")?;

        info!("gateway stopped");
        Ok(())
    }
}

/// Builder for [`Gateway`].
pub struct GatewayBuilder<M: CompletionModel + 'static> {
    config: Option<BotConfig>,
    model: Option<M>,
}

impl<M: CompletionModel + 'static> fmt::Debug for GatewayBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<M: CompletionModel + 'static> Default for GatewayBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: CompletionModel + 'static> GatewayBuilder<M> {
    /// Create an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: None,
            model: None,
        }
    }

    /// Set the bot configuration.
    #[must_use]
    pub fn config(mut self, config: BotConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the completion model.
    #[must_use]
    pub fn model(mut self, model: M) -> Self {
        self.model = Some(model);
        self
    }

    /// Build the gateway.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or the model is not set.
    #[must_use]
    pub fn build(self) -> Gateway<M> {
        let config = self.config.expect("configuration is required");
        let model = self.model.expect("model is required");
        Gateway::new(config, model)
    }
}

// ============================================================================
// Tests
// ============================================================================
