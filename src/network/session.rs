//! Session Management
//!
//! One `Session` per live connection. The auth binding is applied exactly
//! once at construction: the user id has no setter and is only reachable
//! through a read accessor, so nothing after the handshake can rebind a
//! session to another user.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::game::state::{SessionId, UserId};
use crate::network::protocol::ServerEvent;

/// Outbound channel depth per session. A slower client buffers this many
/// events before broadcasts to it start lagging.
pub const SESSION_CHANNEL_DEPTH: usize = 256;

/// Identity resolved during the connection handshake.
#[derive(Debug, Clone)]
pub struct AuthBinding {
    /// User id from a valid token, or None for guests.
    pub user_id: Option<UserId>,
    /// Guests play anonymously.
    pub is_anonymous: bool,
}

impl AuthBinding {
    /// Binding for an unauthenticated guest.
    pub fn guest() -> Self {
        Self {
            user_id: None,
            is_anonymous: true,
        }
    }

    /// Binding for an authenticated user.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            is_anonymous: false,
        }
    }
}

/// Lobby profile set by join_game.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Display name.
    pub name: String,
    /// Avatar tag.
    pub avatar: String,
}

/// One live client connection.
#[derive(Debug)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Identity bound at handshake; immutable afterwards.
    user_id: Option<UserId>,
    /// Whether the session plays as a guest.
    is_anonymous: bool,
    /// Lobby profile once join_game has run.
    pub profile: Option<Profile>,
    /// Outbound event channel to this client's writer task.
    pub sender: mpsc::Sender<ServerEvent>,
}

impl Session {
    /// Create a session with its one-time auth binding.
    pub fn new(id: SessionId, auth: AuthBinding, sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id,
            user_id: auth.user_id,
            is_anonymous: auth.is_anonymous,
            profile: None,
            sender,
        }
    }

    /// The bound user id, if the session authenticated.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Whether the session plays as a guest.
    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }
}

/// Registry of all live sessions; the fanout surface for every outbound
/// event.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected session.
    pub async fn register(&self, session: Session) {
        self.sessions.write().await.insert(session.id.clone(), session);
    }

    /// Remove a session, returning its record.
    pub async fn unregister(&self, id: &SessionId) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Set the lobby profile for a session.
    pub async fn set_profile(&self, id: &SessionId, profile: Profile) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.profile = Some(profile);
        }
    }

    /// Lobby profile of a session, if join_game has run.
    pub async fn profile(&self, id: &SessionId) -> Option<Profile> {
        self.sessions.read().await.get(id)?.profile.clone()
    }

    /// Bound user id of a session.
    pub async fn user_of(&self, id: &SessionId) -> Option<UserId> {
        self.sessions.read().await.get(id)?.user_id().cloned()
    }

    /// Session ids currently bound to a user (multi-session support).
    pub async fn sessions_of_user(&self, user_id: &UserId) -> Vec<SessionId> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id() == Some(user_id))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Send one event to one session. Fire-and-forget: a vanished or
    /// saturated session just drops the event.
    pub async fn send(&self, id: &SessionId, event: ServerEvent) {
        let sender = {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) => session.sender.clone(),
                None => return,
            }
        };
        if sender.send(event).await.is_err() {
            debug!(session = %id, "dropping event for closed session");
        }
    }

    /// Deliver a batch of addressed payloads.
    pub async fn dispatch(&self, payloads: Vec<(SessionId, ServerEvent)>) {
        for (id, event) in payloads {
            self.send(&id, event).await;
        }
    }

    /// Broadcast one event to every session that has joined the lobby.
    pub async fn broadcast_lobby(&self, event: ServerEvent) {
        let senders: Vec<(SessionId, mpsc::Sender<ServerEvent>)> = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .filter(|s| s.profile.is_some())
                .map(|s| (s.id.clone(), s.sender.clone()))
                .collect()
        };
        for (id, sender) in senders {
            if sender.send(event.clone()).await.is_err() {
                debug!(session = %id, "dropping broadcast for closed session");
            }
        }
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
