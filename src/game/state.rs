//! Game State Definitions
//!
//! Canonical state for one played game. Votes and hints use BTreeMap so
//! iteration order is stable for tallying and snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::phase::Phase;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique session identifier (one live connection from one client).
///
/// Doubles as the player id inside a room. Implements Ord for
/// deterministic BTreeMap ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user identifier minted by the auth broker.
pub type UserId = String;

// =============================================================================
// MODES, ROLES, OUTCOMES
// =============================================================================

/// Game mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// The imposter gets no word and knows their role.
    #[default]
    Classic,
    /// The imposter gets a different word and is not told their role.
    Blind,
}

/// Secret role assigned at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Holds the shared word.
    Citizen,
    /// The single hidden adversary.
    Imposter,
}

/// Winning side of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    /// The imposter was voted out.
    Citizens,
    /// Citizens were whittled down to one.
    Imposter,
}

// =============================================================================
// PLAYER
// =============================================================================

/// A player inside a room.
///
/// Hints live in [`GameState`]; this record carries identity and per-game
/// flags. The canonical record never holds a user id, so projections
/// cannot leak one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Session id; doubles as the player id within the room.
    pub session_id: SessionId,
    /// Display name chosen at lobby join.
    pub name: String,
    /// Avatar tag chosen at lobby join.
    pub avatar: String,
    /// Lobby ready flag.
    pub ready: bool,
    /// Secret role, set at game start.
    pub role: Option<Role>,
    /// Voted out this game.
    pub eliminated: bool,
    /// Cast a vote in the current voting phase.
    pub has_voted: bool,
}

impl Player {
    /// Create a player with no game state yet.
    pub fn new(session_id: SessionId, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            session_id,
            name: name.into(),
            avatar: avatar.into(),
            ready: false,
            role: None,
            eliminated: false,
            has_voted: false,
        }
    }

    /// Still in the running (not voted out).
    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    /// Clear per-game flags for a rematch.
    pub fn reset_for_new_game(&mut self) {
        self.ready = false;
        self.role = None;
        self.eliminated = false;
        self.has_voted = false;
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// State of one played game inside a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Unique id for this played game (fresh per start_game).
    pub game_id: Uuid,

    /// Current phase.
    pub phase: Phase,

    /// Word category for this game.
    pub category: String,

    /// The word citizens share.
    pub citizen_word: String,

    /// The imposter's decoy word (Blind mode only).
    pub imposter_word: Option<String>,

    /// Session holding the imposter role.
    pub imposter_id: SessionId,

    /// Speaking order for hint rounds.
    pub turn_order: Vec<SessionId>,

    /// Index of the current speaker within `turn_order`.
    pub current_turn_index: usize,

    /// Seconds left in the current speaker's turn (HintRound only).
    pub turn_time_left: u32,

    /// Seconds left in the current phase.
    pub phase_time_left: u32,

    /// 1-based round counter.
    pub round_number: u32,

    /// Votes cast this voting phase: voter -> target.
    pub votes: BTreeMap<SessionId, SessionId>,

    /// Hints given so far: speaker -> ordered hints.
    pub hints: BTreeMap<SessionId, Vec<String>>,

    /// Player eliminated by the latest vote, if any.
    pub eliminated_id: Option<SessionId>,

    /// Winning side, set when the game ends.
    pub winner: Option<Winner>,
}

impl GameState {
    /// Create a fresh game in the Lobby phase.
    ///
    /// The caller transitions to RoleReveal through the engine so the
    /// transition table stays the single authority on phase changes.
    pub fn new(
        category: String,
        citizen_word: String,
        imposter_word: Option<String>,
        imposter_id: SessionId,
        turn_order: Vec<SessionId>,
    ) -> Self {
        Self {
            game_id: Uuid::new_v4(),
            phase: Phase::Lobby,
            category,
            citizen_word,
            imposter_word,
            imposter_id,
            turn_order,
            current_turn_index: 0,
            turn_time_left: 0,
            phase_time_left: 0,
            round_number: 1,
            votes: BTreeMap::new(),
            hints: BTreeMap::new(),
            eliminated_id: None,
            winner: None,
        }
    }

    /// The session whose turn it is to speak, if the index is in range.
    pub fn current_speaker(&self) -> Option<&SessionId> {
        self.turn_order.get(self.current_turn_index)
    }

    /// Number of hints the given session has submitted.
    pub fn hint_count(&self, session_id: &SessionId) -> usize {
        self.hints.get(session_id).map(Vec::len).unwrap_or(0)
    }

    /// Whether the game has reached its terminal phase.
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from_string(s)
    }

    #[test]
    fn test_new_game_starts_in_lobby() {
        let state = GameState::new(
            "Animals".into(),
            "Cat".into(),
            None,
            sid("p1"),
            vec![sid("p1"), sid("p2"), sid("p3")],
        );
        assert_eq!(state.phase, Phase::Lobby);
        assert_eq!(state.round_number, 1);
        assert!(state.votes.is_empty());
        assert!(state.winner.is_none());
    }

    #[test]
    fn test_current_speaker_follows_index() {
        let mut state = GameState::new(
            "Animals".into(),
            "Cat".into(),
            None,
            sid("p1"),
            vec![sid("p1"), sid("p2")],
        );
        assert_eq!(state.current_speaker(), Some(&sid("p1")));
        state.current_turn_index = 1;
        assert_eq!(state.current_speaker(), Some(&sid("p2")));
        state.current_turn_index = 2;
        assert_eq!(state.current_speaker(), None);
    }

    #[test]
    fn test_session_id_is_transparent_in_json() {
        let id = sid("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_fresh_games_get_distinct_ids() {
        let a = GameState::new("C".into(), "w".into(), None, sid("p1"), vec![]);
        let b = GameState::new("C".into(), "w".into(), None, sid("p1"), vec![]);
        assert_ne!(a.game_id, b.game_id);
    }
}
