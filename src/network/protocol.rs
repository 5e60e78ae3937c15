//! Protocol Events
//!
//! Wire format for client-server communication over WebSocket. Every
//! event is a tagged JSON object; the tag is the event name.

use serde::{Deserialize, Serialize};

use crate::friends::FriendErrorCode;
use crate::game::state::{GameMode, SessionId, UserId};
use crate::network::rate_limit::EventKind;
use crate::network::view::{GameStateView, PlayerView, RoomListEntry, RoomView};
use crate::room::room::RoomError;

/// Chat messages longer than this are truncated after trimming.
pub const CHAT_MAX_LEN: usize = 200;

// =============================================================================
// CLIENT -> SERVER EVENTS
// =============================================================================

/// Events sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Enter the lobby with a display name and avatar.
    JoinGame { name: String, avatar: String },

    /// Create a room and become its owner.
    CreateRoom {
        name: String,
        password: Option<String>,
        category: Option<String>,
        game_mode: Option<GameMode>,
    },

    /// Join an existing room.
    JoinRoom {
        room_id: String,
        password: Option<String>,
    },

    /// Leave the current room.
    LeaveRoom,

    /// Toggle the lobby ready flag.
    SetReady { ready: bool },

    /// Start the game (owner only).
    StartGame { language: Option<String> },

    /// Submit a hint as the current speaker.
    SubmitHint { text: String },

    /// Vote for a player during the voting phase.
    SubmitVote { target: SessionId },

    /// Reset a finished room back to the lobby (owner only).
    PlayAgain,

    /// Send a chat message to the room.
    SendMessage { text: String },

    /// Request the public room list.
    GetRooms,

    /// Friend operations, delegated to the friend collaborator.
    SendFriendRequest { user_id: UserId },
    AcceptFriendRequest { request_id: String },
    DeclineFriendRequest { request_id: String },
    CancelFriendRequest { request_id: String },
    RemoveFriend { user_id: UserId },
    SendRoomInvite { user_id: UserId },
    RespondToInvite { invite_id: String, accept: bool },
    GetPendingInvites,
    GetPendingRequests,
}

impl ClientEvent {
    /// Rate-limit bucket this event falls into.
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::JoinGame { .. } => EventKind::JoinGame,
            ClientEvent::CreateRoom { .. } => EventKind::CreateRoom,
            ClientEvent::JoinRoom { .. } => EventKind::JoinRoom,
            ClientEvent::LeaveRoom => EventKind::LeaveRoom,
            ClientEvent::SetReady { .. } => EventKind::SetReady,
            ClientEvent::StartGame { .. } => EventKind::StartGame,
            ClientEvent::SubmitHint { .. } => EventKind::SubmitHint,
            ClientEvent::SubmitVote { .. } => EventKind::SubmitVote,
            ClientEvent::PlayAgain => EventKind::PlayAgain,
            ClientEvent::SendMessage { .. } => EventKind::SendMessage,
            ClientEvent::GetRooms => EventKind::GetRooms,
            _ => EventKind::Friend,
        }
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// SERVER -> CLIENT EVENTS
// =============================================================================

/// Events sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The caller's own player record.
    PlayerStatus(PlayerView),

    /// Sanitized room snapshot, or null after leaving a room.
    RoomUpdate(Option<RoomView>),

    /// Public room listing.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Role-tailored game snapshot for exactly this recipient.
    GameState(GameStateView),

    /// Chat relayed within a room.
    RoomMessage(ChatMessage),

    /// Validation or authorization failure, enumerated code only.
    Error { code: ErrorCode },

    /// A friend came online.
    FriendOnline { user_id: UserId },

    /// A friend went offline.
    FriendOffline { user_id: UserId },

    /// Online subset of the caller's friends, sent on lobby join.
    FriendsOnlineList { user_ids: Vec<UserId> },

    /// Friend operation failure.
    FriendError {
        code: FriendErrorCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Pending friend requests for the caller.
    PendingRequests { requests: Vec<crate::friends::RequestSummary> },

    /// Pending room invites for the caller.
    PendingInvites { invites: Vec<crate::friends::InviteSummary> },

    /// Server is shutting down.
    Shutdown { reason: String },
}

impl ServerEvent {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// A chat message relayed to a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender's session id.
    pub sender_id: SessionId,
    /// Sender's display name at send time.
    pub sender_name: String,
    /// Trimmed, length-capped text.
    pub text: String,
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Error codes surfaced to the offending client. The wire names are
/// the documentation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    GameNotStarted,
    WrongPhase,
    CannotVoteSelf,
    InvalidTarget,
    /// Reserved; vote validation never raises it today.
    AlreadyVoted,
    NotYourTurn,
    IncorrectPassword,
    RoomFull,
    RoomNotFound,
    GameAlreadyStarted,
    YouAreNotTheHost,
    NeedAtLeastNPlayers,
    CannotUseTheSecretWordAsHint,
    RateLimited,
    NotAuthorized,
}

impl From<crate::game::engine::VoteError> for ErrorCode {
    fn from(err: crate::game::engine::VoteError) -> Self {
        use crate::game::engine::VoteError;
        match err {
            VoteError::GameNotStarted => ErrorCode::GameNotStarted,
            VoteError::WrongPhase => ErrorCode::WrongPhase,
            VoteError::CannotVoteSelf => ErrorCode::CannotVoteSelf,
            VoteError::InvalidTarget => ErrorCode::InvalidTarget,
            VoteError::AlreadyVoted => ErrorCode::AlreadyVoted,
        }
    }
}

impl From<RoomError> for ErrorCode {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::RoomNotFound => ErrorCode::RoomNotFound,
            RoomError::RoomFull => ErrorCode::RoomFull,
            RoomError::IncorrectPassword => ErrorCode::IncorrectPassword,
            RoomError::GameAlreadyStarted => ErrorCode::GameAlreadyStarted,
        }
    }
}
