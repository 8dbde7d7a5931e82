//! Event handling core.
//!
//! [`BotEngine`] turns decoded events into session mutations, provider
//! calls, and outbound replies. Every failure is resolved here — as an
//! error reply on the conversational path, as silence on the inline path —
//! so transports never see an error surface.
//!
//! Concurrency contract: a user's session guard is held for the whole
//! exchange, provider call included. Turns from one user run strictly in
//! arrival order; turns from different users run in parallel.

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use super::commands;
use super::prompt::{DESCRIBE_IMAGE_PROMPT, PromptBuilder};
use crate::channel::{InlineAnswer, Messenger, ReplyFormat};
use crate::events::{ChatCommand, ChatEvent, EventKind, ImageRef, InlineQuery, UserId};
use crate::provider::CompletionModel;
use crate::session::{SessionStore, Turn};
use crate::util::truncate_str;

/// Character budget for inline result previews.
const INLINE_PREVIEW_CHARS: usize = 100;

/// The conversation engine: sessions on one side, a completion model and a
/// messenger on the other.
pub struct BotEngine<M: CompletionModel> {
    store: SessionStore,
    model: M,
    messenger: Arc<dyn Messenger>,
}

impl<M: CompletionModel> BotEngine<M> {
    /// Create an engine over the given store, model, and outbound messenger.
    pub fn new(store: SessionStore, model: M, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            store,
            model,
            messenger,
        }
    }

    /// Handle one inbound event to completion.
    ///
    /// Never returns an error: failures become error replies or logged
    /// silence, per path.
    #[instrument(skip(self, event), fields(user = %event.user_id))]
    pub async fn handle_event(&self, event: ChatEvent) {
        match event.kind {
            EventKind::Text(text) => {
                self.converse(event.user_id, event.chat_id, text, None).await;
            }
            EventKind::Photo { image, caption } => {
                let text = caption.unwrap_or_else(|| DESCRIBE_IMAGE_PROMPT.to_string());
                self.converse(event.user_id, event.chat_id, text, Some(image))
                    .await;
            }
            EventKind::Command(command) => {
                self.handle_command(event.user_id, event.chat_id, &command)
                    .await;
            }
            EventKind::Inline(query) => self.handle_inline(&query).await,
        }
    }

    /// Run one conversational exchange.
    ///
    /// The session guard is taken up front and held until the reply is out.
    /// The user turn is appended only after the provider succeeds, so a
    /// failed exchange leaves the session exactly as it was.
    async fn converse(&self, user: UserId, chat_id: i64, text: String, image: Option<ImageRef>) {
        let handle = self.store.entry(user).await;
        let mut session = handle.lock().await;

        if let Err(err) = self.messenger.send_typing(chat_id).await {
            debug!(chat_id, error = %err, "typing indicator failed");
        }

        let image_bytes = match &image {
            Some(image_ref) => match self.messenger.fetch_image(image_ref).await {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    warn!(user = %user, error = %err, "image download failed");
                    self.send_or_log(chat_id, &format!("⚠️ Error: {err}"), ReplyFormat::Plain)
                        .await;
                    return;
                }
            },
            None => None,
        };

        let prompt = PromptBuilder::build(&session, &text, image_bytes.as_deref());
        match self.model.complete(&prompt).await {
            Ok(completion) => {
                match image {
                    Some(image_ref) => session.push_turn(Turn::user_with_image(text, image_ref)),
                    None => session.push_turn(Turn::user(text)),
                }
                session.push_turn(Turn::assistant(completion.text.clone()));
                session.record_exchange(completion.usage);

                self.send_or_log(chat_id, &completion.text, ReplyFormat::Plain)
                    .await;
            }
            Err(err) => {
                warn!(user = %user, error = %err, "completion failed");
                self.send_or_log(chat_id, &format!("⚠️ Error: {err}"), ReplyFormat::Plain)
                    .await;
            }
        }
    }

    /// Execute a control command. Never calls the provider.
    async fn handle_command(&self, user: UserId, chat_id: i64, command: &ChatCommand) {
        let Some(reply) = commands::dispatch(&self.store, user, command).await else {
            return;
        };
        self.send_or_log(chat_id, &reply.text, reply.format).await;
    }

    /// Answer an inline query, or stay silent.
    ///
    /// Inline queries are stateless: they prompt with the seed persona and
    /// model, never touch a session, and swallow every failure.
    async fn handle_inline(&self, query: &InlineQuery) {
        let text = query.text.trim();
        if text.is_empty() {
            return;
        }

        let defaults = self.store.defaults();
        let prompt = PromptBuilder::inline(&defaults.persona, &defaults.model, text);

        let completion = match self.model.complete(&prompt).await {
            Ok(completion) => completion,
            Err(err) => {
                debug!(error = %err, "inline completion failed");
                return;
            }
        };

        let answer = InlineAnswer {
            preview: truncate_str(&completion.text, INLINE_PREVIEW_CHARS),
            text: completion.text,
        };
        if let Err(err) = self.messenger.answer_inline(&query.query_id, &answer).await {
            debug!(error = %err, "inline answer failed");
        }
    }

    async fn send_or_log(&self, chat_id: i64, text: &str, format: ReplyFormat) {
        if let Err(err) = self.messenger.send_message(chat_id, text, format).await {
            error!(chat_id, error = %err, "failed to send reply");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
