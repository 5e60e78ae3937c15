//! Room Lifecycle
//!
//! A room owns its player list, its game state, and its ticker handle.
//! All mutation goes through the per-room lock held by the store, so the
//! methods here are plain synchronous state changes.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::game::state::{GameState, GameMode, Player, SessionId};

/// Room identifier: 6 upper-alphanumeric characters.
pub type RoomId = String;

/// Length of generated room ids.
pub const ROOM_ID_LEN: usize = 6;

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Gathering players.
    Lobby,
    /// A game is running.
    Playing,
    /// The game finished; waiting for play_again or departures.
    Ended,
}

/// Room membership errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoomError {
    /// No room with that id.
    #[error("room not found")]
    RoomNotFound,

    /// Room is at capacity.
    #[error("room is full")]
    RoomFull,

    /// Supplied password does not match.
    #[error("incorrect password")]
    IncorrectPassword,

    /// Room is no longer accepting players.
    #[error("game already started")]
    GameAlreadyStarted,
}

/// A server-owned game room.
///
/// The password never leaves this struct: the type is deliberately not
/// serializable, and projections are built field-by-field in the view
/// layer.
#[derive(Debug)]
pub struct Room {
    /// Room identifier.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Join password, if the room is locked.
    password: Option<String>,
    /// Players in insertion order; the head inherits ownership.
    pub players: Vec<Player>,
    /// Session of the current owner.
    pub owner_id: SessionId,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Preferred word category, if the owner picked one.
    pub category: Option<String>,
    /// Game mode for the next game.
    pub mode: GameMode,
    /// Running or finished game, if any.
    pub game: Option<GameState>,
    /// When the current game started.
    pub started_at: Option<Instant>,
    /// Handle of the 1 Hz ticker task while a game runs.
    pub(crate) ticker: Option<JoinHandle<()>>,
}

impl Room {
    /// Create a room with its first player as owner.
    pub fn new(
        id: RoomId,
        name: String,
        password: Option<String>,
        category: Option<String>,
        mode: GameMode,
        owner: Player,
    ) -> Self {
        let owner_id = owner.session_id.clone();
        Self {
            id,
            name,
            password,
            players: vec![owner],
            owner_id,
            status: RoomStatus::Lobby,
            category,
            mode,
            game: None,
            started_at: None,
            ticker: None,
        }
    }

    /// Whether the room requires a password to join.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Check a supplied password against the room's.
    pub fn password_matches(&self, supplied: Option<&str>) -> bool {
        match &self.password {
            None => true,
            Some(expected) => supplied == Some(expected.as_str()),
        }
    }

    /// Look up a player by session id.
    pub fn player(&self, session_id: &SessionId) -> Option<&Player> {
        self.players.iter().find(|p| &p.session_id == session_id)
    }

    /// Look up a player mutably by session id.
    pub fn player_mut(&mut self, session_id: &SessionId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.session_id == session_id)
    }

    /// Whether the session is a member of this room.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.player(session_id).is_some()
    }

    /// Admit a player after password / status / capacity checks.
    pub fn admit(&mut self, player: Player, password: Option<&str>, max_players: usize) -> Result<(), RoomError> {
        if !self.password_matches(password) {
            return Err(RoomError::IncorrectPassword);
        }
        if self.status != RoomStatus::Lobby {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.players.len() >= max_players {
            return Err(RoomError::RoomFull);
        }
        if !self.contains(&player.session_id) {
            self.players.push(player);
        }
        Ok(())
    }

    /// Remove a player, transferring ownership to the new head of the
    /// list when the owner departs. Returns the removed player.
    pub fn remove_player(&mut self, session_id: &SessionId) -> Option<Player> {
        let idx = self.players.iter().position(|p| &p.session_id == session_id)?;
        let removed = self.players.remove(idx);

        if self.owner_id == removed.session_id {
            if let Some(next_owner) = self.players.first() {
                self.owner_id = next_owner.session_id.clone();
            }
        }

        Some(removed)
    }

    /// Scrub a departed session out of a live game.
    ///
    /// Removes the session from the turn order, from votes (as voter and
    /// as target), and from hints, then re-anchors the turn cursor.
    /// Returns true when the departed session held the imposter role and
    /// the game was still undecided, which forces a citizens win.
    pub fn scrub_departed(&mut self, session_id: &SessionId) -> bool {
        let Some(game) = self.game.as_mut() else {
            return false;
        };

        game.turn_order.retain(|s| s != session_id);
        game.votes.remove(session_id);
        game.votes.retain(|_, target| target != session_id);
        game.hints.remove(session_id);

        if !game.turn_order.is_empty() && game.current_turn_index >= game.turn_order.len() {
            game.current_turn_index %= game.turn_order.len();
        }

        &game.imposter_id == session_id && !game.is_over()
    }

    /// Players still in the running.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    /// Whether no players remain.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Reset the room to a fresh lobby, clearing game state and
    /// per-player game flags.
    pub fn reset_to_lobby(&mut self) {
        self.cancel_ticker();
        self.game = None;
        self.started_at = None;
        self.status = RoomStatus::Lobby;
        for player in &mut self.players {
            player.reset_for_new_game();
        }
    }

    /// Abort the ticker task, if one is running.
    pub fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    /// Seconds since the current game started.
    pub fn game_duration_secs(&self) -> Option<u64> {
        self.started_at.map(|t| t.elapsed().as_secs())
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::phase::Phase;

    fn sid(s: &str) -> SessionId {
        SessionId::from_string(s)
    }

    fn player(s: &str) -> Player {
        Player::new(sid(s), s.to_uppercase(), "fox")
    }

    fn test_room() -> Room {
        Room::new(
            "ABC123".into(),
            "Test Room".into(),
            None,
            None,
            GameMode::Classic,
            player("p1"),
        )
    }

    #[test]
    fn test_owner_is_first_player() {
        let room = test_room();
        assert_eq!(room.owner_id, sid("p1"));
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.status, RoomStatus::Lobby);
    }

    #[test]
    fn test_admit_checks_capacity() {
        let mut room = test_room();
        for i in 2..=3 {
            room.admit(player(&format!("p{i}")), None, 3).unwrap();
        }
        let err = room.admit(player("p4"), None, 3).unwrap_err();
        assert_eq!(err, RoomError::RoomFull);
        assert_eq!(room.players.len(), 3);
    }

    #[test]
    fn test_admit_checks_password() {
        let mut room = Room::new(
            "ABC123".into(),
            "Locked".into(),
            Some("hunter2".into()),
            None,
            GameMode::Classic,
            player("p1"),
        );
        assert_eq!(
            room.admit(player("p2"), None, 8).unwrap_err(),
            RoomError::IncorrectPassword
        );
        assert_eq!(
            room.admit(player("p2"), Some("wrong"), 8).unwrap_err(),
            RoomError::IncorrectPassword
        );
        assert!(room.admit(player("p2"), Some("hunter2"), 8).is_ok());
    }

    #[test]
    fn test_admit_checks_status() {
        let mut room = test_room();
        room.status = RoomStatus::Playing;
        assert_eq!(
            room.admit(player("p2"), None, 8).unwrap_err(),
            RoomError::GameAlreadyStarted
        );
    }

    #[test]
    fn test_ownership_transfers_in_insertion_order() {
        let mut room = test_room();
        room.admit(player("p2"), None, 8).unwrap();
        room.admit(player("p3"), None, 8).unwrap();

        room.remove_player(&sid("p1"));
        assert_eq!(room.owner_id, sid("p2"));

        // Non-owner departure leaves ownership alone.
        room.remove_player(&sid("p3"));
        assert_eq!(room.owner_id, sid("p2"));
    }

    #[test]
    fn test_scrub_removes_all_traces() {
        let mut room = test_room();
        room.admit(player("p2"), None, 8).unwrap();
        room.admit(player("p3"), None, 8).unwrap();

        let mut game = GameState::new(
            "Animals".into(),
            "Cat".into(),
            None,
            sid("p1"),
            vec![sid("p1"), sid("p2"), sid("p3")],
        );
        game.phase = Phase::Voting;
        game.votes.insert(sid("p2"), sid("p3"));
        game.votes.insert(sid("p3"), sid("p2"));
        game.votes.insert(sid("p1"), sid("p3"));
        game.hints.insert(sid("p3"), vec!["fast".into()]);
        room.game = Some(game);

        room.remove_player(&sid("p3"));
        let imposter_left = room.scrub_departed(&sid("p3"));
        assert!(!imposter_left);

        let game = room.game.as_ref().unwrap();
        assert!(!game.turn_order.contains(&sid("p3")));
        assert!(!game.votes.contains_key(&sid("p3")));
        assert!(!game.votes.values().any(|t| t == &sid("p3")));
        assert!(!game.hints.contains_key(&sid("p3")));
    }

    #[test]
    fn test_scrub_detects_imposter_departure() {
        let mut room = test_room();
        room.admit(player("p2"), None, 8).unwrap();
        room.game = Some(GameState::new(
            "Animals".into(),
            "Cat".into(),
            None,
            sid("p1"),
            vec![sid("p1"), sid("p2")],
        ));

        assert!(room.scrub_departed(&sid("p1")));
    }

    #[test]
    fn test_scrub_wraps_turn_cursor() {
        let mut room = test_room();
        let mut game = GameState::new(
            "Animals".into(),
            "Cat".into(),
            None,
            sid("p1"),
            vec![sid("p1"), sid("p2"), sid("p3")],
        );
        game.current_turn_index = 2;
        room.game = Some(game);

        room.scrub_departed(&sid("p3"));
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.current_turn_index, 0);
    }

    #[test]
    fn test_reset_to_lobby_clears_game_flags() {
        let mut room = test_room();
        room.admit(player("p2"), None, 8).unwrap();
        room.status = RoomStatus::Ended;
        room.game = Some(GameState::new(
            "Animals".into(),
            "Cat".into(),
            None,
            sid("p1"),
            vec![sid("p1"), sid("p2")],
        ));
        if let Some(p) = room.player_mut(&sid("p2")) {
            p.eliminated = true;
            p.has_voted = true;
        }

        room.reset_to_lobby();
        assert_eq!(room.status, RoomStatus::Lobby);
        assert!(room.game.is_none());
        assert!(room.players.iter().all(|p| !p.eliminated && !p.has_voted));
    }
}
