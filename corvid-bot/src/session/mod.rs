//! Per-user conversation state and the concurrent store that owns it.

mod state;
mod store;

pub use state::{SessionSettings, SessionState, Turn, TurnRole, UsageStats};
pub use store::{SessionDefaults, SessionHandle, SessionStore};
