//! Telegram transport built on teloxide.
//!
//! Long-polls the Bot API through a teloxide [`Dispatcher`], decodes updates
//! into [`ChatEvent`]s, and implements the outbound [`Messenger`] surface.
//! Image downloads and inline-query answers go through the raw Bot API over
//! [`reqwest`], where the typed payloads get in the way.
//!
//! # Setup
//!
//! 1. Create a bot via [@BotFather](https://t.me/botfather)
//! 2. Enable inline mode with `/setinline` if inline queries are wanted
//! 3. Pass the token through [`TelegramChannelConfig`]

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InlineQuery, ParseMode};
use tracing::{debug, info};

use crate::agent::BotEngine;
use crate::channel::{InlineAnswer, Messenger, ReplyFormat};
use crate::error::{ChannelError, ChannelResult};
use crate::events::{ChatCommand, ChatEvent, ImageRef, UserId};
use crate::provider::CompletionModel;

/// Bot API endpoint prefix.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

// ============================================================================
// Configuration
// ============================================================================

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramChannelConfig {
    /// Bot token from @BotFather.
    pub token: String,
    /// Allowed user IDs. Empty means allow everyone.
    pub allowed_users: Vec<i64>,
}

impl TelegramChannelConfig {
    /// Create a config with the given token and no allowlist.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            allowed_users: Vec::new(),
        }
    }

    /// Add an allowed user ID.
    #[must_use]
    pub fn allow_user(mut self, user_id: i64) -> Self {
        self.allowed_users.push(user_id);
        self
    }

    /// Add multiple allowed user IDs.
    #[must_use]
    pub fn allow_users(mut self, user_ids: impl IntoIterator<Item = i64>) -> Self {
        self.allowed_users.extend(user_ids);
        self
    }

    /// Check if a user is allowed.
    #[must_use]
    pub fn is_user_allowed(&self, user_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }
}

impl fmt::Debug for TelegramChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramChannelConfig")
            .field("token", &"[REDACTED]")
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

// ============================================================================
// Outbound API
// ============================================================================

/// Outbound half of the transport.
///
/// Typed calls go through teloxide; `getFile` downloads and
/// `answerInlineQuery` use the raw Bot API over reqwest.
struct TelegramApi {
    bot: Bot,
    http: reqwest::Client,
    token: String,
}

impl TelegramApi {
    fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
            http: reqwest::Client::new(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{TELEGRAM_API_BASE}/bot{}/{method}", self.token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{TELEGRAM_API_BASE}/file/bot{}/{file_path}", self.token)
    }

    /// POST a raw Bot API method and unwrap its `result` field.
    async fn call_method(&self, method: &str, body: &Value) -> ChannelResult<Value> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChannelError::api(format!(
                "{method} failed with {status}: {error_text}"
            )));
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| ChannelError::request(e.to_string()))?;

        if !payload.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let description = payload
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ChannelError::api(format!("{method} failed: {description}")));
        }

        Ok(payload.get("result").cloned().unwrap_or(Value::Null))
    }
}

impl fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramApi")
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Messenger for TelegramApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        format: ReplyFormat,
    ) -> ChannelResult<()> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        let request = match format {
            ReplyFormat::Plain => request,
            ReplyFormat::Markdown => request.parse_mode(ParseMode::Markdown),
        };
        request.await.map_err(|e| ChannelError::send(e.to_string()))?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> ChannelResult<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(|e| ChannelError::send(e.to_string()))?;
        Ok(())
    }

    async fn fetch_image(&self, image: &ImageRef) -> ChannelResult<Vec<u8>> {
        let file = self
            .call_method("getFile", &json!({ "file_id": image.file_id }))
            .await?;
        let file_path = file
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| ChannelError::api("getFile response has no file_path"))?;

        let response = self
            .http
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(|e| ChannelError::request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChannelError::api(format!(
                "file download failed with {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChannelError::request(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn answer_inline(&self, query_id: &str, answer: &InlineAnswer) -> ChannelResult<()> {
        let body = json!({
            "inline_query_id": query_id,
            "results": [inline_result_payload(answer)],
            "cache_time": 0,
        });
        self.call_method("answerInlineQuery", &body).await?;
        Ok(())
    }
}

/// Build the single article result for an inline answer.
fn inline_result_payload(answer: &InlineAnswer) -> Value {
    json!({
        "type": "article",
        "id": "1",
        "title": answer.preview,
        "input_message_content": { "message_text": answer.text },
    })
}

// ============================================================================
// Inbound decoding
// ============================================================================

/// Decode a Telegram message into a [`ChatEvent`], if it carries one.
///
/// Messages without a sender, and media kinds other than photos, are
/// dropped here.
fn decode_message(msg: &Message) -> Option<ChatEvent> {
    #[allow(clippy::cast_possible_wrap)] // User ID won't exceed i64 max
    let user_id = UserId(msg.from.as_ref()?.id.0 as i64);
    let chat_id = msg.chat.id.0;

    if let Some(text) = msg.text() {
        return Some(match ChatCommand::parse(text) {
            Some(command) => ChatEvent::command(user_id, chat_id, command),
            None => ChatEvent::text(user_id, chat_id, text),
        });
    }

    let photos = msg.photo()?;
    // Sizes arrive smallest first; take the largest.
    let photo = photos.last()?;
    Some(ChatEvent::photo(
        user_id,
        chat_id,
        ImageRef::new(photo.file.id.to_string()),
        msg.caption().map(str::to_string),
    ))
}

// ============================================================================
// Channel
// ============================================================================

/// Telegram channel: inbound update dispatch plus the outbound messenger.
pub struct TelegramChannel {
    config: TelegramChannelConfig,
    api: Arc<TelegramApi>,
}

impl TelegramChannel {
    /// Create a channel with the given configuration.
    #[must_use]
    pub fn new(config: TelegramChannelConfig) -> Self {
        let api = Arc::new(TelegramApi::new(&config.token));
        Self { config, api }
    }

    /// Outbound surface, for wiring into an engine.
    #[must_use]
    pub fn messenger(&self) -> Arc<dyn Messenger> {
        Arc::clone(&self.api) as Arc<dyn Messenger>
    }

    /// Long-poll for updates and feed decoded events into the engine.
    ///
    /// Verifies the token against `getMe` first, so a bad token fails fast
    /// instead of polling forever. Runs until the dispatcher shuts down.
    /// Updates from unlisted users are dropped before they reach the engine.
    pub async fn run<M>(&self, engine: Arc<BotEngine<M>>) -> ChannelResult<()>
    where
        M: CompletionModel + 'static,
    {
        let me = self
            .api
            .call_method("getMe", &json!({}))
            .await
            .map_err(|e| ChannelError::start(e.to_string()))?;
        let username = me.get("username").and_then(Value::as_str).unwrap_or("unknown");

        let message_engine = Arc::clone(&engine);
        let message_config = self.config.clone();
        let message_handler = Update::filter_message().endpoint(move |msg: Message| {
            let engine = Arc::clone(&message_engine);
            let config = message_config.clone();

            async move {
                let Some(event) = decode_message(&msg) else {
                    return Ok::<(), teloxide::RequestError>(());
                };

                if !config.is_user_allowed(event.user_id.0) {
                    debug!(user = %event.user_id, "dropping message from unlisted user");
                    return Ok(());
                }

                engine.handle_event(event).await;
                Ok(())
            }
        });

        let inline_engine = Arc::clone(&engine);
        let inline_config = self.config.clone();
        let inline_handler = Update::filter_inline_query().endpoint(move |query: InlineQuery| {
            let engine = Arc::clone(&inline_engine);
            let config = inline_config.clone();

            async move {
                #[allow(clippy::cast_possible_wrap)] // User ID won't exceed i64 max
                let user_id = query.from.id.0 as i64;
                if !config.is_user_allowed(user_id) {
                    debug!(user_id, "dropping inline query from unlisted user");
                    return Ok::<(), teloxide::RequestError>(());
                }

                let event = ChatEvent::inline(UserId(user_id), query.id.to_string(), query.query);
                engine.handle_event(event).await;
                Ok(())
            }
        });

        let handler = dptree::entry()
            .branch(message_handler)
            .branch(inline_handler);

        let mut dispatcher = Dispatcher::builder(self.api.bot.clone(), handler)
            .enable_ctrlc_handler()
            .build();

        info!(username, "telegram channel started");
        dispatcher.dispatch().await;
        info!("telegram channel stopped");

        Ok(())
    }
}

impl fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TelegramChannelConfig::new("token123")
            .allow_user(12345)
            .allow_users([67890, 11111]);

        assert_eq!(config.token, "token123");
        assert!(config.is_user_allowed(12345));
        assert!(config.is_user_allowed(11111));
        assert!(!config.is_user_allowed(99999));
    }

    #[test]
    fn test_empty_allowlist_allows_everyone() {
        let config = TelegramChannelConfig::new("token");
        assert!(config.is_user_allowed(12345));
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = TelegramChannelConfig::new("supersecret").allow_user(7);
        let debug = format!("{config:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_api_urls() {
        let api = TelegramApi::new("123:ABC");
        assert_eq!(
            api.method_url("getFile"),
            "https://api.telegram.org/bot123:ABC/getFile"
        );
        assert_eq!(
            api.file_url("photos/file_1.jpg"),
            "https://api.telegram.org/file/bot123:ABC/photos/file_1.jpg"
        );
    }

    #[test]
    fn test_api_debug_redacts_token() {
        let api = TelegramApi::new("123:SECRET");
        let debug = format!("{api:?}");
        assert!(!debug.contains("SECRET"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_inline_result_payload_shape() {
        let answer = InlineAnswer {
            text: "full answer".to_string(),
            preview: "preview".to_string(),
        };

        let payload = inline_result_payload(&answer);
        assert_eq!(payload["type"], "article");
        assert_eq!(payload["id"], "1");
        assert_eq!(payload["title"], "preview");
        assert_eq!(payload["input_message_content"]["message_text"], "full answer");
    }
}
