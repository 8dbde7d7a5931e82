//! Concurrent per-user session map.
//!
//! The map lock is held only to look up or insert an entry. Each session
//! sits behind its own fair mutex; the conversational path holds that guard
//! for a whole exchange (including the provider call), which serializes
//! same-user events in acquisition order while distinct users proceed in
//! parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::state::{SessionSettings, SessionState, UsageStats};
use crate::config::ChatConfig;
use crate::events::UserId;

/// Seed values applied to newly created sessions.
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    /// Persona for new sessions.
    pub persona: String,
    /// Model for new sessions.
    pub model: String,
    /// History cap for new sessions.
    pub history_limit: usize,
}

impl From<&ChatConfig> for SessionDefaults {
    fn from(chat: &ChatConfig) -> Self {
        Self {
            persona: chat.persona.clone(),
            model: chat.model.clone(),
            history_limit: chat.history_limit,
        }
    }
}

/// Shared handle to one user's session.
pub type SessionHandle = Arc<Mutex<SessionState>>;

#[derive(Debug)]
struct StoreInner {
    sessions: RwLock<HashMap<UserId, SessionHandle>>,
    defaults: SessionDefaults,
}

/// Owns the mapping from user identity to session state.
///
/// Cheap to clone; clones share the same map. The store itself cannot fail:
/// every operation totalizes over any [`UserId`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Create an empty store with the given session defaults.
    #[must_use]
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                sessions: RwLock::new(HashMap::new()),
                defaults,
            }),
        }
    }

    /// Get the session handle for a user, creating it on first touch.
    ///
    /// New sessions are seeded with the default persona and model, empty
    /// history, and zero usage.
    pub async fn entry(&self, user: UserId) -> SessionHandle {
        {
            let sessions = self.inner.sessions.read().await;
            if let Some(handle) = sessions.get(&user) {
                return Arc::clone(handle);
            }
        }

        let mut sessions = self.inner.sessions.write().await;
        let handle = sessions.entry(user).or_insert_with(|| {
            debug!(user = %user, "creating session");
            let settings = SessionSettings {
                persona: self.inner.defaults.persona.clone(),
                model: self.inner.defaults.model.clone(),
            };
            Arc::new(Mutex::new(SessionState::new(
                settings,
                self.inner.defaults.history_limit,
            )))
        });
        Arc::clone(handle)
    }

    /// Clear a user's history; settings and usage are untouched.
    pub async fn reset_history(&self, user: UserId) {
        let handle = self.entry(user).await;
        handle.lock().await.clear_history();
    }

    /// Replace a user's persona; history and usage are untouched.
    pub async fn update_persona(&self, user: UserId, persona: impl Into<String> + Send) {
        let handle = self.entry(user).await;
        handle.lock().await.settings.persona = persona.into();
    }

    /// Current persona for a user.
    pub async fn persona(&self, user: UserId) -> String {
        let handle = self.entry(user).await;
        let session = handle.lock().await;
        session.settings.persona.clone()
    }

    /// Usage counters and retained history length for a user.
    pub async fn usage_report(&self, user: UserId) -> (UsageStats, usize) {
        let handle = self.entry(user).await;
        let session = handle.lock().await;
        (session.usage, session.history().len())
    }

    /// Seed defaults applied to new sessions.
    ///
    /// Stateless paths (inline queries) prompt with these instead of any
    /// per-user state.
    #[must_use]
    pub fn defaults(&self) -> &SessionDefaults {
        &self.inner.defaults
    }

    /// Number of sessions created since startup, for lifecycle logging.
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TokenUsage;
    use crate::session::state::Turn;
    use std::time::Duration;

    fn store() -> SessionStore {
        SessionStore::new(SessionDefaults {
            persona: "default persona".to_string(),
            model: "gpt-4.1-mini".to_string(),
            history_limit: 80,
        })
    }

    #[tokio::test]
    async fn test_entry_creates_once() {
        let store = store();
        let first = store.entry(UserId(1)).await;
        let second = store.entry(UserId(1)).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_new_session_is_seeded_with_defaults() {
        let store = store();
        let handle = store.entry(UserId(7)).await;
        let session = handle.lock().await;

        assert_eq!(session.settings.persona, "default persona");
        assert_eq!(session.settings.model, "gpt-4.1-mini");
        assert!(session.history().is_empty());
        assert_eq!(session.usage.messages, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_entry_yields_one_session() {
        let store = store();
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.entry(UserId(5)).await }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        for handle in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], handle));
        }
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_reset_isolation() {
        let store = store();

        {
            let handle = store.entry(UserId(1)).await;
            let mut session = handle.lock().await;
            session.push_turn(Turn::user("hi"));
            session.push_turn(Turn::assistant("hello"));
            session.record_exchange(TokenUsage::new(5, 3));
        }
        store.update_persona(UserId(1), "pirate").await;

        {
            let handle = store.entry(UserId(2)).await;
            let mut session = handle.lock().await;
            session.push_turn(Turn::user("other user"));
        }

        store.reset_history(UserId(1)).await;

        let (usage, history_len) = store.usage_report(UserId(1)).await;
        assert_eq!(history_len, 0);
        assert_eq!(usage.messages, 1);
        assert_eq!(usage.tokens_in, 5);
        assert_eq!(store.persona(UserId(1)).await, "pirate");

        // The other user's session is untouched.
        let (_, other_len) = store.usage_report(UserId(2)).await;
        assert_eq!(other_len, 1);
        assert_eq!(store.persona(UserId(2)).await, "default persona");
    }

    #[tokio::test]
    async fn test_users_do_not_block_each_other() {
        let store = store();

        // Hold user 1's session guard while touching user 2.
        let handle = store.entry(UserId(1)).await;
        let _guard = handle.lock().await;

        let other = tokio::time::timeout(Duration::from_millis(100), async {
            let handle = store.entry(UserId(2)).await;
            let mut session = handle.lock().await;
            session.push_turn(Turn::user("independent"));
        })
        .await;

        assert!(other.is_ok(), "another user's session must stay reachable");
    }

    #[tokio::test]
    async fn test_same_user_appends_serialize() {
        let store = store();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let handle = store.entry(UserId(3)).await;
                let mut session = handle.lock().await;
                session.push_turn(Turn::user(format!("msg {i}")));
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let (_, history_len) = store.usage_report(UserId(3)).await;
        assert_eq!(history_len, 8, "no append may be lost or duplicated");
    }
}
