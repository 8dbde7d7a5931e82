//! Prompt assembly.
//!
//! Every completion call gets a freshly assembled prompt: persona first,
//! the retained history in order, then the live turn as the final user
//! message. Nothing is cached between calls, so persona and model edits
//! take effect on the very next exchange.

use crate::provider::{ChatPrompt, PromptMessage, PromptPart, PromptRole};
use crate::session::{SessionState, TurnRole};

/// Caption substitute when a photo arrives without one.
pub const DESCRIBE_IMAGE_PROMPT: &str = "Describe this image.";

/// Assembles provider prompts from session state.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the prompt for one conversational turn.
    ///
    /// The live turn is not yet part of `session`; it is appended here as
    /// the final user message, with the live image (when present) riding
    /// only on that block. Historical photo turns replay as text.
    #[must_use]
    pub fn build(session: &SessionState, text: &str, image: Option<&[u8]>) -> ChatPrompt {
        let mut messages = Vec::with_capacity(session.history().len() + 2);
        messages.push(PromptMessage::system(session.settings.persona.clone()));

        for turn in session.history() {
            let role = match turn.role {
                TurnRole::User => PromptRole::User,
                TurnRole::Assistant => PromptRole::Assistant,
            };
            messages.push(PromptMessage::text(role, turn.content.clone()));
        }

        let mut parts = vec![PromptPart::Text(text.to_string())];
        if let Some(bytes) = image {
            parts.push(PromptPart::Image(bytes.to_vec()));
        }
        messages.push(PromptMessage::new(PromptRole::User, parts));

        ChatPrompt {
            model: session.settings.model.clone(),
            messages,
        }
    }

    /// Build the stateless prompt for an inline query.
    ///
    /// Inline queries carry no history and never touch a session; they run
    /// against the given persona and model.
    #[must_use]
    pub fn inline(persona: &str, model: &str, text: &str) -> ChatPrompt {
        ChatPrompt {
            model: model.to_string(),
            messages: vec![
                PromptMessage::system(persona),
                PromptMessage::user(text),
            ],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ImageRef;
    use crate::session::{SessionSettings, Turn};

    fn session() -> SessionState {
        SessionState::new(
            SessionSettings {
                persona: "You are terse.".to_string(),
                model: "gpt-4.1-mini".to_string(),
            },
            80,
        )
    }

    #[test]
    fn test_first_message_has_two_blocks() {
        let prompt = PromptBuilder::build(&session(), "Hello!", None);

        assert_eq!(prompt.model, "gpt-4.1-mini");
        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, PromptRole::System);
        assert_eq!(
            prompt.messages[0].parts,
            vec![PromptPart::Text("You are terse.".to_string())]
        );
        assert_eq!(prompt.messages[1].role, PromptRole::User);
        assert_eq!(
            prompt.messages[1].parts,
            vec![PromptPart::Text("Hello!".to_string())]
        );
    }

    #[test]
    fn test_history_replays_in_order() {
        let mut session = session();
        session.push_turn(Turn::user("first"));
        session.push_turn(Turn::assistant("reply"));

        let prompt = PromptBuilder::build(&session, "second", None);

        let roles: Vec<PromptRole> = prompt.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                PromptRole::System,
                PromptRole::User,
                PromptRole::Assistant,
                PromptRole::User,
            ]
        );
        assert_eq!(
            prompt.messages[3].parts,
            vec![PromptPart::Text("second".to_string())]
        );
    }

    #[test]
    fn test_live_image_only_on_final_block() {
        let mut session = session();
        session.push_turn(Turn::user_with_image("old photo", ImageRef::new("file-1")));
        session.push_turn(Turn::assistant("a cat"));

        let prompt = PromptBuilder::build(&session, "and this one?", Some(&[0xff, 0xd8]));

        // The historical photo turn replays as text only.
        assert_eq!(
            prompt.messages[1].parts,
            vec![PromptPart::Text("old photo".to_string())]
        );
        // The live turn carries text plus the image.
        let last = prompt.messages.last().unwrap();
        assert_eq!(last.parts.len(), 2);
        assert_eq!(last.parts[1], PromptPart::Image(vec![0xff, 0xd8]));
    }

    #[test]
    fn test_same_inputs_build_identical_prompts() {
        let mut session = session();
        session.push_turn(Turn::user("one"));
        session.push_turn(Turn::assistant("two"));

        let first = PromptBuilder::build(&session, "three", None);
        let second = PromptBuilder::build(&session, "three", None);

        assert_eq!(first, second);
    }

    #[test]
    fn test_settings_thread_through() {
        let mut session = session();
        session.settings.persona = "You are a pirate.".to_string();
        session.settings.model = "gpt-5".to_string();

        let prompt = PromptBuilder::build(&session, "ahoy", None);

        assert_eq!(prompt.model, "gpt-5");
        assert_eq!(
            prompt.messages[0].parts,
            vec![PromptPart::Text("You are a pirate.".to_string())]
        );
    }

    #[test]
    fn test_inline_prompt_is_stateless() {
        let prompt = PromptBuilder::inline("default persona", "gpt-4.1-mini", "quick question");

        assert_eq!(prompt.model, "gpt-4.1-mini");
        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, PromptRole::System);
        assert_eq!(prompt.messages[1].role, PromptRole::User);
    }
}
