//! Presence Index
//!
//! Tracks which authenticated users are online and through how many
//! sessions. A user may hold several concurrent sessions; presence
//! transitions fire on the session count crossing zero, never on any
//! single session.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::game::state::{SessionId, UserId};

/// userId -> set of live session ids.
#[derive(Default)]
pub struct PresenceIndex {
    inner: RwLock<HashMap<UserId, HashSet<SessionId>>>,
}

impl PresenceIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for a user. Returns true on the 0 -> 1
    /// transition (the user just came online).
    pub async fn connect(&self, user_id: &UserId, session_id: SessionId) -> bool {
        let mut inner = self.inner.write().await;
        let sessions = inner.entry(user_id.clone()).or_default();
        let was_offline = sessions.is_empty();
        sessions.insert(session_id);
        was_offline
    }

    /// Drop a session for a user. Returns true on the 1 -> 0 transition
    /// (the user just went offline). Empty entries are removed.
    pub async fn disconnect(&self, user_id: &UserId, session_id: &SessionId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(sessions) = inner.get_mut(user_id) else {
            return false;
        };
        sessions.remove(session_id);
        if sessions.is_empty() {
            inner.remove(user_id);
            true
        } else {
            false
        }
    }

    /// Whether the user has at least one live session.
    pub async fn is_online(&self, user_id: &UserId) -> bool {
        self.inner.read().await.contains_key(user_id)
    }

    /// Filter `candidates` down to those currently online.
    pub async fn online_among(&self, candidates: &[UserId]) -> Vec<UserId> {
        let inner = self.inner.read().await;
        candidates
            .iter()
            .filter(|u| inner.contains_key(*u))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from_string(s)
    }

    #[tokio::test]
    async fn test_first_session_comes_online() {
        let index = PresenceIndex::new();
        assert!(index.connect(&"u1".into(), sid("s1")).await);
        assert!(index.is_online(&"u1".into()).await);
    }

    #[tokio::test]
    async fn test_second_session_is_silent() {
        let index = PresenceIndex::new();
        assert!(index.connect(&"u1".into(), sid("s1")).await);
        assert!(!index.connect(&"u1".into(), sid("s2")).await);
    }

    #[tokio::test]
    async fn test_offline_only_on_last_session() {
        let index = PresenceIndex::new();
        index.connect(&"u1".into(), sid("s1")).await;
        index.connect(&"u1".into(), sid("s2")).await;

        assert!(!index.disconnect(&"u1".into(), &sid("s1")).await);
        assert!(index.is_online(&"u1".into()).await);

        assert!(index.disconnect(&"u1".into(), &sid("s2")).await);
        assert!(!index.is_online(&"u1".into()).await);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_user_is_noop() {
        let index = PresenceIndex::new();
        assert!(!index.disconnect(&"ghost".into(), &sid("s1")).await);
    }

    #[tokio::test]
    async fn test_online_among_filters() {
        let index = PresenceIndex::new();
        index.connect(&"u1".into(), sid("s1")).await;
        index.connect(&"u3".into(), sid("s3")).await;

        let online = index
            .online_among(&["u1".into(), "u2".into(), "u3".into()])
            .await;
        assert_eq!(online, vec!["u1".to_string(), "u3".to_string()]);
    }
}
