//! Friend Collaborator
//!
//! Friend requests, friendships, and room invites live outside the core;
//! the orchestrator only delegates to this trait and relays the results.
//! The in-memory implementation backs tests and single-process deploys.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::game::state::UserId;
use crate::room::room::RoomId;

/// Hard cap on friendships per user.
pub const MAX_FRIENDS: usize = 100;

/// Friend operation error codes surfaced to clients. The wire names
/// are the documentation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendErrorCode {
    InvalidUserId,
    UserNotFound,
    AlreadyFriends,
    RequestNotFound,
    RequestAlreadyHandled,
    NotAuthorized,
    SelfRequest,
    MaxFriendsReached,
    DatabaseError,
}

/// A friend operation failure.
#[derive(Debug, Clone, Error)]
#[error("friend operation failed: {code:?}")]
pub struct FriendError {
    /// Enumerated code.
    pub code: FriendErrorCode,
    /// Optional human-readable detail.
    pub message: Option<String>,
}

impl FriendError {
    /// Error with a bare code.
    pub fn code(code: FriendErrorCode) -> Self {
        Self { code, message: None }
    }
}

/// A pending friend request.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSummary {
    pub id: String,
    pub from: UserId,
    pub to: UserId,
}

/// A pending room invite.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteSummary {
    pub id: String,
    pub from: UserId,
    pub room_id: RoomId,
}

/// Friend collaborator interface.
#[async_trait]
pub trait FriendService: Send + Sync {
    /// Friends of a user, for presence fanout.
    async fn friends_of(&self, user_id: &UserId) -> Vec<UserId>;

    /// Send a friend request.
    async fn send_request(&self, from: &UserId, to: &UserId) -> Result<(), FriendError>;

    /// Accept a request addressed to `user_id`; returns the new friend.
    async fn accept_request(&self, user_id: &UserId, request_id: &str)
        -> Result<UserId, FriendError>;

    /// Decline a request addressed to `user_id`.
    async fn decline_request(&self, user_id: &UserId, request_id: &str)
        -> Result<(), FriendError>;

    /// Cancel a request previously sent by `user_id`.
    async fn cancel_request(&self, user_id: &UserId, request_id: &str)
        -> Result<(), FriendError>;

    /// Remove an existing friendship.
    async fn remove_friend(&self, user_id: &UserId, friend: &UserId) -> Result<(), FriendError>;

    /// Invite a friend to a room.
    async fn send_room_invite(
        &self,
        from: &UserId,
        to: &UserId,
        room_id: &RoomId,
    ) -> Result<(), FriendError>;

    /// Accept or decline an invite; accepting returns the room id.
    async fn respond_to_invite(
        &self,
        user_id: &UserId,
        invite_id: &str,
        accept: bool,
    ) -> Result<Option<RoomId>, FriendError>;

    /// Pending invites addressed to a user.
    async fn pending_invites(&self, user_id: &UserId) -> Vec<InviteSummary>;

    /// Pending requests addressed to a user.
    async fn pending_requests(&self, user_id: &UserId) -> Vec<RequestSummary>;
}

// =============================================================================
// IN-MEMORY IMPLEMENTATION
// =============================================================================

#[derive(Default)]
struct FriendTables {
    friendships: HashMap<UserId, HashSet<UserId>>,
    requests: HashMap<String, RequestSummary>,
    invites: HashMap<String, InviteSummary>,
    invite_targets: HashMap<String, UserId>,
}

/// In-memory friend service for tests and single-process deploys.
#[derive(Default)]
pub struct InMemoryFriendService {
    tables: Mutex<FriendTables>,
}

impl InMemoryFriendService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a friendship directly (test setup).
    pub fn add_friendship(&self, a: &UserId, b: &UserId) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .friendships
            .entry(a.clone())
            .or_default()
            .insert(b.clone());
        tables
            .friendships
            .entry(b.clone())
            .or_default()
            .insert(a.clone());
    }
}

#[async_trait]
impl FriendService for InMemoryFriendService {
    async fn friends_of(&self, user_id: &UserId) -> Vec<UserId> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .friendships
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn send_request(&self, from: &UserId, to: &UserId) -> Result<(), FriendError> {
        if to.is_empty() {
            return Err(FriendError::code(FriendErrorCode::InvalidUserId));
        }
        if from == to {
            return Err(FriendError::code(FriendErrorCode::SelfRequest));
        }
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let already = tables
            .friendships
            .get(from)
            .map(|set| set.contains(to))
            .unwrap_or(false);
        if already {
            return Err(FriendError::code(FriendErrorCode::AlreadyFriends));
        }
        let friend_count = tables.friendships.get(from).map(HashSet::len).unwrap_or(0);
        if friend_count >= MAX_FRIENDS {
            return Err(FriendError::code(FriendErrorCode::MaxFriendsReached));
        }
        let id = Uuid::new_v4().to_string();
        tables.requests.insert(
            id.clone(),
            RequestSummary {
                id,
                from: from.clone(),
                to: to.clone(),
            },
        );
        Ok(())
    }

    async fn accept_request(
        &self,
        user_id: &UserId,
        request_id: &str,
    ) -> Result<UserId, FriendError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let request = tables
            .requests
            .get(request_id)
            .cloned()
            .ok_or_else(|| FriendError::code(FriendErrorCode::RequestNotFound))?;
        if &request.to != user_id {
            return Err(FriendError::code(FriendErrorCode::NotAuthorized));
        }
        tables.requests.remove(request_id);
        tables
            .friendships
            .entry(request.from.clone())
            .or_default()
            .insert(request.to.clone());
        tables
            .friendships
            .entry(request.to)
            .or_default()
            .insert(request.from.clone());
        Ok(request.from)
    }

    async fn decline_request(
        &self,
        user_id: &UserId,
        request_id: &str,
    ) -> Result<(), FriendError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let request = tables
            .requests
            .get(request_id)
            .ok_or_else(|| FriendError::code(FriendErrorCode::RequestNotFound))?;
        if &request.to != user_id {
            return Err(FriendError::code(FriendErrorCode::NotAuthorized));
        }
        tables.requests.remove(request_id);
        Ok(())
    }

    async fn cancel_request(&self, user_id: &UserId, request_id: &str) -> Result<(), FriendError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let request = tables
            .requests
            .get(request_id)
            .ok_or_else(|| FriendError::code(FriendErrorCode::RequestNotFound))?;
        if &request.from != user_id {
            return Err(FriendError::code(FriendErrorCode::NotAuthorized));
        }
        tables.requests.remove(request_id);
        Ok(())
    }

    async fn remove_friend(&self, user_id: &UserId, friend: &UserId) -> Result<(), FriendError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let existed = tables
            .friendships
            .get_mut(user_id)
            .map(|set| set.remove(friend))
            .unwrap_or(false);
        if !existed {
            return Err(FriendError::code(FriendErrorCode::UserNotFound));
        }
        if let Some(set) = tables.friendships.get_mut(friend) {
            set.remove(user_id);
        }
        Ok(())
    }

    async fn send_room_invite(
        &self,
        from: &UserId,
        to: &UserId,
        room_id: &RoomId,
    ) -> Result<(), FriendError> {
        if from == to {
            return Err(FriendError::code(FriendErrorCode::SelfRequest));
        }
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let are_friends = tables
            .friendships
            .get(from)
            .map(|set| set.contains(to))
            .unwrap_or(false);
        if !are_friends {
            return Err(FriendError::code(FriendErrorCode::NotAuthorized));
        }
        let id = Uuid::new_v4().to_string();
        tables.invites.insert(
            id.clone(),
            InviteSummary {
                id: id.clone(),
                from: from.clone(),
                room_id: room_id.clone(),
            },
        );
        tables.invite_targets.insert(id, to.clone());
        Ok(())
    }

    async fn respond_to_invite(
        &self,
        user_id: &UserId,
        invite_id: &str,
        accept: bool,
    ) -> Result<Option<RoomId>, FriendError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let target = tables
            .invite_targets
            .get(invite_id)
            .cloned()
            .ok_or_else(|| FriendError::code(FriendErrorCode::RequestNotFound))?;
        if &target != user_id {
            return Err(FriendError::code(FriendErrorCode::NotAuthorized));
        }
        let invite = tables
            .invites
            .remove(invite_id)
            .ok_or_else(|| FriendError::code(FriendErrorCode::RequestAlreadyHandled))?;
        tables.invite_targets.remove(invite_id);
        Ok(accept.then_some(invite.room_id))
    }

    async fn pending_invites(&self, user_id: &UserId) -> Vec<InviteSummary> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .invites
            .values()
            .filter(|inv| tables.invite_targets.get(&inv.id) == Some(user_id))
            .cloned()
            .collect()
    }

    async fn pending_requests(&self, user_id: &UserId) -> Vec<RequestSummary> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .requests
            .values()
            .filter(|req| &req.to == user_id)
            .cloned()
            .collect()
    }
}
