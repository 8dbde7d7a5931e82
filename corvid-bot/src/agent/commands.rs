//! Control-plane command handling.
//!
//! Commands touch session state through the store and return canned reply
//! text. No command ever calls the completion provider, so the control
//! plane stays responsive while conversational turns are in flight.

use tracing::{debug, info};

use crate::channel::ReplyFormat;
use crate::events::{ChatCommand, UserId};
use crate::session::SessionStore;

const START_BANNER: &str = "🚀 *Corvid Telegram Bot*\n\nCommands:\n/start – help message\n/reset – clear history\n/system <text> – set personality\n/stats – usage\n/help – tips";

const HELP_TIPS: &str = "🤖 Tips:\n• Be specific\n• I remember context\n• Use /reset to change topics";

const HISTORY_CLEARED: &str = "🔄 History cleared.";

const PERSONA_UPDATED: &str = "✅ System prompt updated.";

/// A command's reply text plus its rendering mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Reply text.
    pub text: String,
    /// How the transport should render it.
    pub format: ReplyFormat,
}

impl CommandReply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
        }
    }

    fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Markdown,
        }
    }
}

/// Execute a command against the store.
///
/// Returns `None` for unknown commands, which are dropped without a reply.
pub async fn dispatch(
    store: &SessionStore,
    user: UserId,
    command: &ChatCommand,
) -> Option<CommandReply> {
    match command {
        ChatCommand::Start => Some(CommandReply::markdown(START_BANNER)),
        ChatCommand::Help => Some(CommandReply::plain(HELP_TIPS)),
        ChatCommand::Reset => {
            store.reset_history(user).await;
            info!(user = %user, "history cleared");
            Some(CommandReply::plain(HISTORY_CLEARED))
        }
        ChatCommand::Persona(Some(text)) => {
            store.update_persona(user, text.clone()).await;
            info!(user = %user, "persona updated");
            Some(CommandReply::plain(PERSONA_UPDATED))
        }
        ChatCommand::Persona(None) => {
            let persona = store.persona(user).await;
            Some(CommandReply::markdown(format!("*Current:*\n{persona}")))
        }
        ChatCommand::Stats => {
            let (usage, history_len) = store.usage_report(user).await;
            Some(CommandReply::plain(format!(
                "📊 Stats\nMessages: {}\nTokens in: {}\nTokens out: {}\nHistory: {}",
                usage.messages, usage.tokens_in, usage.tokens_out, history_len
            )))
        }
        ChatCommand::Unknown(name) => {
            debug!(user = %user, command = %name, "ignoring unknown command");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TokenUsage;
    use crate::session::{SessionDefaults, Turn};

    fn store() -> SessionStore {
        SessionStore::new(SessionDefaults {
            persona: "default persona".to_string(),
            model: "gpt-4.1-mini".to_string(),
            history_limit: 80,
        })
    }

    #[tokio::test]
    async fn test_start_returns_markdown_banner() {
        let reply = dispatch(&store(), UserId(1), &ChatCommand::Start)
            .await
            .unwrap();

        assert_eq!(reply.format, ReplyFormat::Markdown);
        assert!(reply.text.contains("/reset"));
        assert!(reply.text.contains("/system"));
        assert!(reply.text.contains("/stats"));
    }

    #[tokio::test]
    async fn test_help_is_plain() {
        let reply = dispatch(&store(), UserId(1), &ChatCommand::Help)
            .await
            .unwrap();

        assert_eq!(reply.format, ReplyFormat::Plain);
        assert!(reply.text.contains("/reset"));
    }

    #[tokio::test]
    async fn test_reset_clears_history_and_confirms() {
        let store = store();
        {
            let handle = store.entry(UserId(1)).await;
            let mut session = handle.lock().await;
            session.push_turn(Turn::user("hi"));
            session.push_turn(Turn::assistant("hello"));
        }

        let reply = dispatch(&store, UserId(1), &ChatCommand::Reset)
            .await
            .unwrap();

        assert_eq!(reply.text, "🔄 History cleared.");
        let (_, history_len) = store.usage_report(UserId(1)).await;
        assert_eq!(history_len, 0);
    }

    #[tokio::test]
    async fn test_persona_update_confirms() {
        let store = store();
        let command = ChatCommand::Persona(Some("You are a pirate.".to_string()));

        let reply = dispatch(&store, UserId(1), &command).await.unwrap();

        assert_eq!(reply.text, "✅ System prompt updated.");
        assert_eq!(store.persona(UserId(1)).await, "You are a pirate.");
    }

    #[tokio::test]
    async fn test_persona_query_reports_current() {
        let store = store();
        store.update_persona(UserId(1), "You are terse.").await;

        let reply = dispatch(&store, UserId(1), &ChatCommand::Persona(None))
            .await
            .unwrap();

        assert_eq!(reply.format, ReplyFormat::Markdown);
        assert_eq!(reply.text, "*Current:*\nYou are terse.");
    }

    #[tokio::test]
    async fn test_stats_reports_usage_and_history() {
        let store = store();
        {
            let handle = store.entry(UserId(1)).await;
            let mut session = handle.lock().await;
            session.push_turn(Turn::user("hi"));
            session.push_turn(Turn::assistant("hello"));
            session.record_exchange(TokenUsage::new(12, 7));
        }

        let reply = dispatch(&store, UserId(1), &ChatCommand::Stats)
            .await
            .unwrap();

        assert_eq!(
            reply.text,
            "📊 Stats\nMessages: 1\nTokens in: 12\nTokens out: 7\nHistory: 2"
        );
    }

    #[tokio::test]
    async fn test_unknown_command_is_silent() {
        let store = store();

        let reply = dispatch(&store, UserId(1), &ChatCommand::Unknown("frobnicate".to_string()))
            .await;

        assert!(reply.is_none());
        assert_eq!(store.session_count().await, 0, "no session should be created");
    }
}
