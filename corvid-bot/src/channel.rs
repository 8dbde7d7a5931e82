//! Outbound messaging seam.
//!
//! The engine sends replies through a [`Messenger`] and never touches a
//! transport directly, so the whole conversational core is testable with an
//! in-memory fake. The one real implementation lives in
//! [`crate::channels::telegram`].

use async_trait::async_trait;

use crate::error::ChannelResult;
use crate::events::ImageRef;

/// Rendering mode for an outbound reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    /// Send the text verbatim.
    #[default]
    Plain,
    /// Ask the transport to render Markdown.
    Markdown,
}

/// A single inline query answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAnswer {
    /// Full answer text delivered when the result is picked.
    pub text: String,
    /// Short preview shown in the result list.
    pub preview: String,
}

/// Outbound surface of a chat transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str, format: ReplyFormat)
    -> ChannelResult<()>;

    /// Show a typing indicator in a chat.
    ///
    /// Best-effort; callers treat failures as non-fatal.
    async fn send_typing(&self, chat_id: i64) -> ChannelResult<()>;

    /// Download the bytes of a shared image.
    async fn fetch_image(&self, image: &ImageRef) -> ChannelResult<Vec<u8>>;

    /// Answer an inline query with a single article result.
    async fn answer_inline(&self, query_id: &str, answer: &InlineAnswer) -> ChannelResult<()>;
}
