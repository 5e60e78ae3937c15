//! View Projections
//!
//! Converts canonical room and game state into the payloads clients are
//! allowed to see. This is the cheat barrier: the room projection drops
//! the password and never carries user ids, and each game projection is
//! computed for exactly one recipient, so no client ever receives another
//! player's role or word.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::phase::Phase;
use crate::game::state::{GameMode, GameState, Player, SessionId, Winner};
use crate::network::protocol::ServerEvent;
use crate::room::room::{Room, RoomStatus};

// =============================================================================
// PAYLOAD TYPES
// =============================================================================

/// A player as seen by other clients: identity and flags, no role.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub session_id: SessionId,
    pub name: String,
    pub avatar: String,
    pub ready: bool,
    pub eliminated: bool,
    pub has_voted: bool,
}

/// A room as broadcast to its members.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub players: Vec<PlayerView>,
    pub owner_id: SessionId,
    pub status: RoomStatus,
    pub category: Option<String>,
    pub game_mode: GameMode,
    pub has_password: bool,
}

/// A room as listed publicly in the lobby.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub id: String,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub status: RoomStatus,
    pub has_password: bool,
    pub category: Option<String>,
    pub owner_name: String,
}

/// Game snapshot tailored to one recipient.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateView {
    pub game_id: Uuid,
    pub phase: Phase,
    pub category: String,
    /// The recipient's word; None for the Classic-mode imposter.
    pub word: Option<String>,
    /// Whether the recipient is the imposter. Always false in Blind
    /// mode, which hides the role even from the imposter.
    pub is_imposter: bool,
    pub round_number: u32,
    pub turn_order: Vec<SessionId>,
    pub current_turn_index: usize,
    pub current_speaker: Option<SessionId>,
    pub turn_time_left: u32,
    pub phase_time_left: u32,
    pub hints: BTreeMap<SessionId, Vec<String>>,
    /// Populated only during VoteResult and GameOver.
    pub votes: BTreeMap<SessionId, SessionId>,
    pub eliminated_id: Option<SessionId>,
    pub winner: Option<Winner>,
    /// Revealed only at GameOver.
    pub imposter_id: Option<SessionId>,
}

// =============================================================================
// PROJECTION FUNCTIONS
// =============================================================================

/// Project a player for broadcast.
pub fn player_view(player: &Player) -> PlayerView {
    PlayerView {
        session_id: player.session_id.clone(),
        name: player.name.clone(),
        avatar: player.avatar.clone(),
        ready: player.ready,
        eliminated: player.eliminated,
        has_voted: player.has_voted,
    }
}

/// Project a room for broadcast to its members.
pub fn room_view(room: &Room) -> RoomView {
    RoomView {
        id: room.id.clone(),
        name: room.name.clone(),
        players: room.players.iter().map(player_view).collect(),
        owner_id: room.owner_id.clone(),
        status: room.status,
        category: room.category.clone(),
        game_mode: room.mode,
        has_password: room.has_password(),
    }
}

/// Project a room for the public lobby listing.
pub fn room_list_entry(room: &Room, max_players: usize) -> RoomListEntry {
    let owner_name = room
        .player(&room.owner_id)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    RoomListEntry {
        id: room.id.clone(),
        name: room.name.clone(),
        player_count: room.players.len(),
        max_players,
        status: room.status,
        has_password: room.has_password(),
        category: room.category.clone(),
        owner_name,
    }
}

/// Project the game for a single recipient with role-dependent word
/// visibility.
pub fn game_view_for(room: &Room, game: &GameState, recipient: &SessionId) -> GameStateView {
    let is_recipient_imposter = &game.imposter_id == recipient;

    let (word, is_imposter) = match room.mode {
        GameMode::Classic => {
            if is_recipient_imposter {
                (None, true)
            } else {
                (Some(game.citizen_word.clone()), false)
            }
        }
        GameMode::Blind => {
            let word = if is_recipient_imposter {
                game.imposter_word
                    .clone()
                    .or_else(|| Some(game.citizen_word.clone()))
            } else {
                Some(game.citizen_word.clone())
            };
            (word, false)
        }
    };

    let reveal_votes = matches!(game.phase, Phase::VoteResult | Phase::GameOver);
    let reveal_imposter = game.phase == Phase::GameOver;

    GameStateView {
        game_id: game.game_id,
        phase: game.phase,
        category: game.category.clone(),
        word,
        is_imposter,
        round_number: game.round_number,
        turn_order: game.turn_order.clone(),
        current_turn_index: game.current_turn_index,
        current_speaker: game.current_speaker().cloned(),
        turn_time_left: game.turn_time_left,
        phase_time_left: game.phase_time_left,
        hints: game.hints.clone(),
        votes: if reveal_votes {
            game.votes.clone()
        } else {
            BTreeMap::new()
        },
        eliminated_id: game.eliminated_id.clone(),
        winner: game.winner,
        imposter_id: if reveal_imposter {
            Some(game.imposter_id.clone())
        } else {
            None
        },
    }
}

/// Build the full broadcast for a room: one room update per member plus
/// one tailored game snapshot per member when a game exists.
pub fn room_payloads(room: &Room) -> Vec<(SessionId, ServerEvent)> {
    let update = ServerEvent::RoomUpdate(Some(room_view(room)));
    let mut payloads: Vec<(SessionId, ServerEvent)> = room
        .players
        .iter()
        .map(|p| (p.session_id.clone(), update.clone()))
        .collect();

    if let Some(game) = &room.game {
        for player in &room.players {
            let view = game_view_for(room, game, &player.session_id);
            payloads.push((player.session_id.clone(), ServerEvent::GameState(view)));
        }
    }

    payloads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from_string(s)
    }

    fn player(s: &str) -> Player {
        Player::new(sid(s), s.to_uppercase(), "fox")
    }

    fn room_with_game(mode: GameMode) -> Room {
        let mut room = Room::new(
            "AB12CD".into(),
            "Secret Room".into(),
            Some("hunter2".into()),
            None,
            mode,
            player("p1"),
        );
        room.admit(player("p2"), Some("hunter2"), 8).unwrap();
        room.admit(player("p3"), Some("hunter2"), 8).unwrap();
        let imposter_word = match mode {
            GameMode::Blind => Some("Dog".to_string()),
            GameMode::Classic => None,
        };
        room.game = Some(GameState::new(
            "Animals".into(),
            "Cat".into(),
            imposter_word,
            sid("p2"),
            vec![sid("p1"), sid("p2"), sid("p3")],
        ));
        room
    }

    #[test]
    fn test_room_view_has_no_password() {
        let room = room_with_game(GameMode::Classic);
        let view = room_view(&room);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password\":"));
        assert!(view.has_password);
    }

    #[test]
    fn test_player_view_carries_no_role_or_user_id() {
        let mut room = room_with_game(GameMode::Classic);
        room.player_mut(&sid("p2")).unwrap().role = Some(crate::game::state::Role::Imposter);
        let json = serde_json::to_string(&room_view(&room)).unwrap();
        assert!(!json.contains("role"));
        assert!(!json.contains("user_id"));
        assert!(!json.contains("IMPOSTER"));
    }

    #[test]
    fn test_classic_imposter_gets_no_word() {
        let room = room_with_game(GameMode::Classic);
        let game = room.game.as_ref().unwrap();

        let imposter = game_view_for(&room, game, &sid("p2"));
        assert_eq!(imposter.word, None);
        assert!(imposter.is_imposter);

        let citizen = game_view_for(&room, game, &sid("p1"));
        assert_eq!(citizen.word.as_deref(), Some("Cat"));
        assert!(!citizen.is_imposter);
    }

    #[test]
    fn test_blind_everyone_gets_a_word_and_no_role() {
        let room = room_with_game(GameMode::Blind);
        let game = room.game.as_ref().unwrap();

        for p in ["p1", "p2", "p3"] {
            let view = game_view_for(&room, game, &sid(p));
            assert!(view.word.is_some(), "{p} missing word");
            assert!(!view.is_imposter, "{p} sees a role in blind mode");
        }
        let imposter = game_view_for(&room, game, &sid("p2"));
        assert_eq!(imposter.word.as_deref(), Some("Dog"));
        let citizen = game_view_for(&room, game, &sid("p3"));
        assert_eq!(citizen.word.as_deref(), Some("Cat"));
    }

    #[test]
    fn test_votes_hidden_until_vote_result() {
        let mut room = room_with_game(GameMode::Classic);
        {
            let game = room.game.as_mut().unwrap();
            game.phase = Phase::Voting;
            game.votes.insert(sid("p1"), sid("p2"));
        }
        let game = room.game.as_ref().unwrap();
        let view = game_view_for(&room, game, &sid("p1"));
        assert!(view.votes.is_empty());

        room.game.as_mut().unwrap().phase = Phase::VoteResult;
        let game = room.game.as_ref().unwrap();
        let view = game_view_for(&room, game, &sid("p1"));
        assert_eq!(view.votes.len(), 1);
    }

    #[test]
    fn test_imposter_id_revealed_only_at_game_over() {
        let mut room = room_with_game(GameMode::Classic);
        room.game.as_mut().unwrap().phase = Phase::Voting;
        let game = room.game.as_ref().unwrap();
        assert_eq!(game_view_for(&room, game, &sid("p1")).imposter_id, None);

        room.game.as_mut().unwrap().phase = Phase::GameOver;
        let game = room.game.as_ref().unwrap();
        assert_eq!(
            game_view_for(&room, game, &sid("p1")).imposter_id,
            Some(sid("p2"))
        );
    }

    #[test]
    fn test_room_payloads_address_every_member() {
        let room = room_with_game(GameMode::Classic);
        let payloads = room_payloads(&room);
        // One room update plus one game view per player.
        assert_eq!(payloads.len(), 6);
        for p in ["p1", "p2", "p3"] {
            assert!(payloads.iter().any(|(s, e)| s == &sid(p)
                && matches!(e, ServerEvent::GameState(_))));
        }
    }

    #[test]
    fn test_list_entry_shape() {
        let room = room_with_game(GameMode::Classic);
        let entry = room_list_entry(&room, 8);
        assert_eq!(entry.player_count, 3);
        assert_eq!(entry.max_players, 8);
        assert_eq!(entry.owner_name, "P1");
        assert!(entry.has_password);
    }
}
