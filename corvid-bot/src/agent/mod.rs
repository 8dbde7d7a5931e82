//! Conversation core: prompt assembly, command handling, and the engine
//! that ties sessions, provider, and messenger together.

pub mod commands;
mod engine;
mod prompt;

pub use commands::CommandReply;
pub use engine::BotEngine;
pub use prompt::{DESCRIBE_IMAGE_PROMPT, PromptBuilder};
