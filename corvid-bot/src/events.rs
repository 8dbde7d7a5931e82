//! Decoded inbound events.
//!
//! The channel layer turns transport-specific updates into these types; the
//! engine consumes them without ever touching wire formats. One event is
//! produced per inbound user action.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identity Types
// ============================================================================

/// Stable identity of an end user, as assigned by the messaging channel.
///
/// Sessions are keyed by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to an image held by the messaging channel.
///
/// Only the handle is ever stored; bytes are fetched live when a prompt is
/// assembled for the turn that carried the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Channel-assigned file identifier.
    pub file_id: String,
}

impl ImageRef {
    /// Create an image reference from a channel file id.
    #[must_use]
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Control commands understood by the bot.
///
/// These mutate or report session state and never enter the conversational
/// path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatCommand {
    /// `/start` — greeting and command overview.
    Start,
    /// `/help` — usage tips.
    Help,
    /// `/reset` — clear conversation history.
    Reset,
    /// `/system [text]` — set the persona, or report the current one when
    /// no argument is given.
    Persona(Option<String>),
    /// `/stats` — usage counters and history size.
    Stats,
    /// Any other slash command; ignored without a reply.
    Unknown(String),
}

impl ChatCommand {
    /// Parse a message text as a command.
    ///
    /// Returns `None` unless the text starts with `/`. The command word is
    /// matched case-insensitively and an `@botname` suffix is stripped, so
    /// group-chat forms like `/reset@corvid_bot` work. Remaining words are
    /// joined with single spaces as the argument.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let mut words = rest.split_whitespace();
        let word = words.next()?;
        let name = word.split('@').next().unwrap_or(word).to_ascii_lowercase();

        let arg = {
            let tail: Vec<&str> = words.collect();
            if tail.is_empty() {
                None
            } else {
                Some(tail.join(" "))
            }
        };

        Some(match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "reset" => Self::Reset,
            "stats" => Self::Stats,
            "system" => Self::Persona(arg),
            _ => Self::Unknown(name),
        })
    }
}

// ============================================================================
// Events
// ============================================================================

/// A stateless inline query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineQuery {
    /// Channel-assigned query identifier, echoed back when answering.
    pub query_id: String,
    /// Free-form query text.
    pub text: String,
}

/// What an inbound event carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Plain conversational text.
    Text(String),
    /// A photo with an optional caption.
    Photo {
        /// Handle to the photo bytes.
        image: ImageRef,
        /// Caption text, if the user provided one.
        caption: Option<String>,
    },
    /// A control command.
    Command(ChatCommand),
    /// A stateless inline query.
    Inline(InlineQuery),
}

/// One decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// The user who triggered the event; keys the session.
    pub user_id: UserId,
    /// The chat to reply into. For inline queries this mirrors the user id
    /// and is never used — replies go through the query id instead.
    pub chat_id: i64,
    /// Decoded payload.
    pub kind: EventKind,
}

impl ChatEvent {
    /// Create a text event.
    #[must_use]
    pub fn text(user_id: UserId, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id,
            kind: EventKind::Text(text.into()),
        }
    }

    /// Create a photo event.
    #[must_use]
    pub fn photo(user_id: UserId, chat_id: i64, image: ImageRef, caption: Option<String>) -> Self {
        Self {
            user_id,
            chat_id,
            kind: EventKind::Photo { image, caption },
        }
    }

    /// Create a command event.
    #[must_use]
    pub const fn command(user_id: UserId, chat_id: i64, command: ChatCommand) -> Self {
        Self {
            user_id,
            chat_id,
            kind: EventKind::Command(command),
        }
    }

    /// Create an inline-query event.
    #[must_use]
    pub fn inline(user_id: UserId, query_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id: user_id.0,
            kind: EventKind::Inline(InlineQuery {
                query_id: query_id.into(),
                text: text.into(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
