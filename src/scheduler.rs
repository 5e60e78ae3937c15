//! Phase Scheduler
//!
//! Each Playing room owns exactly one 1 Hz ticker task. A tick locks the
//! room, decrements the active counter, runs the completion handler when
//! it hits zero, and fans out fresh snapshots. The same completion
//! handlers are reachable synchronously so command handlers can trigger
//! them early (all votes in) or forcibly (imposter disconnect).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::GameConfig;
use crate::game::engine::{self, TIMEOUT_HINT};
use crate::game::phase::Phase;
use crate::game::state::Winner;
use crate::network::session::SessionRegistry;
use crate::network::view;
use crate::room::room::{Room, RoomStatus};
use crate::stats::{GameEndSummary, PlayerOutcome, StatsSink};

/// What a single tick did to a room.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// A game finished this tick; record it.
    pub ended: Option<GameEndSummary>,
    /// The room no longer needs its ticker.
    pub stop: bool,
}

// =============================================================================
// TICKER TASK
// =============================================================================

/// Spawn the 1 Hz ticker for a Playing room.
///
/// The task exits when the room leaves the Playing state; the handle is
/// also stored on the room so departures can abort it deterministically.
pub fn spawn_room_ticker(
    room: Arc<RwLock<Room>>,
    config: Arc<GameConfig>,
    sessions: Arc<SessionRegistry>,
    stats: Arc<dyn StatsSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately; consume it so
        // the phase clock starts a full second after spawn.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let (outcome, payloads) = {
                let mut room = room.write().await;
                if room.status != RoomStatus::Playing {
                    break;
                }
                let outcome = tick_room(&mut room, &config);
                (outcome, view::room_payloads(&room))
            };

            sessions.dispatch(payloads).await;

            if let Some(summary) = outcome.ended {
                stats.record_game_end(summary).await;
            }
            if outcome.stop {
                break;
            }
        }

        let mut room = room.write().await;
        room.ticker = None;
        debug!(room = %room.id, "room ticker exited");
    })
}

// =============================================================================
// TICK DRIVER
// =============================================================================

/// Advance a room by one second.
pub fn tick_room(room: &mut Room, config: &GameConfig) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    let Some(phase) = room.game.as_ref().map(|g| g.phase) else {
        outcome.stop = true;
        return outcome;
    };

    match phase {
        Phase::Lobby | Phase::GameOver => {
            outcome.stop = true;
        }
        Phase::HintRound => {
            let expired = match room.game.as_mut() {
                Some(game) => {
                    game.turn_time_left = game.turn_time_left.saturating_sub(1);
                    game.turn_time_left == 0
                }
                None => false,
            };
            if expired {
                record_turn_timeout(room);
                advance_turn(room, config);
            }
        }
        Phase::RoleReveal | Phase::Discussion | Phase::Voting | Phase::VoteResult => {
            let expired = match room.game.as_mut() {
                Some(game) => {
                    game.phase_time_left = game.phase_time_left.saturating_sub(1);
                    game.phase_time_left == 0
                }
                None => false,
            };
            if expired {
                match phase {
                    Phase::RoleReveal | Phase::Discussion => {
                        if let Some(next) = phase.next() {
                            transition_to(room, next, config);
                        }
                    }
                    Phase::Voting => resolve_voting(room, config),
                    Phase::VoteResult => {
                        outcome.ended = complete_vote_result(room, config);
                        if outcome.ended.is_some() {
                            outcome.stop = true;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    outcome
}

// =============================================================================
// COMPLETION HANDLERS
// =============================================================================

/// Apply a phase transition through the engine, with post-transition
/// anchoring of turn and vote bookkeeping.
///
/// An illegal edge is a programmer error: it is logged and the room is
/// left untouched, never surfaced to clients.
pub fn transition_to(room: &mut Room, target: Phase, config: &GameConfig) {
    let Some(game) = room.game.as_ref() else {
        return;
    };

    match engine::apply_phase_transition(game, target, config) {
        Ok(mut next) => {
            if target == Phase::HintRound {
                next.current_turn_index =
                    engine::next_active_turn(&next.turn_order, &room.players, 0).unwrap_or(0);
            }
            room.game = Some(next);
            if target == Phase::Voting {
                for player in &mut room.players {
                    player.has_voted = false;
                }
            }
        }
        Err(err) => {
            error!(room = %room.id, from = ?game.phase, to = ?target, %err, "refused phase transition");
        }
    }
}

/// Record the timeout sentinel for the current speaker.
///
/// Submission advances the cursor immediately, so a cursor still parked
/// on the speaker at expiry means no hint arrived this turn.
fn record_turn_timeout(room: &mut Room) {
    if let Some(game) = room.game.as_mut() {
        if let Some(speaker) = game.current_speaker().cloned() {
            game.hints.entry(speaker).or_default().push(TIMEOUT_HINT.to_string());
        }
    }
}

/// Move to the next speaker, or close the hint sub-round.
///
/// When every active player has spoken: run another sub-round while
/// `round_number` is below the configured hint rounds, otherwise open
/// the discussion.
pub fn advance_turn(room: &mut Room, config: &GameConfig) {
    let next_index = {
        let Some(game) = room.game.as_ref() else {
            return;
        };
        engine::next_active_turn(&game.turn_order, &room.players, game.current_turn_index + 1)
    };

    match next_index {
        Some(idx) => {
            if let Some(game) = room.game.as_mut() {
                game.current_turn_index = idx;
                game.turn_time_left = config.hint_turn_secs;
            }
        }
        None => {
            let start_new_sub_round = room
                .game
                .as_ref()
                .map(|g| g.round_number < config.hint_rounds)
                .unwrap_or(false);
            if start_new_sub_round {
                let first = {
                    let Some(game) = room.game.as_ref() else {
                        return;
                    };
                    engine::next_active_turn(&game.turn_order, &room.players, 0)
                };
                if let Some(game) = room.game.as_mut() {
                    game.round_number += 1;
                    game.current_turn_index = first.unwrap_or(0);
                    game.turn_time_left = config.hint_turn_secs;
                }
            } else {
                transition_to(room, Phase::Discussion, config);
            }
        }
    }
}

/// Close the voting phase: tally, mark the eliminated player, and show
/// the result. A tie still moves to VoteResult with nobody eliminated.
pub fn resolve_voting(room: &mut Room, config: &GameConfig) {
    let in_voting = room
        .game
        .as_ref()
        .map(|g| g.phase == Phase::Voting)
        .unwrap_or(false);
    if !in_voting {
        return;
    }

    let eliminated = room
        .game
        .as_ref()
        .and_then(|g| engine::calculate_eliminated(&g.votes));

    if let Some(id) = &eliminated {
        if let Some(player) = room.player_mut(id) {
            player.eliminated = true;
        }
        info!(room = %room.id, player = %id, "player voted out");
    } else {
        debug!(room = %room.id, "vote tied, nobody eliminated");
    }

    if let Some(game) = room.game.as_mut() {
        game.eliminated_id = eliminated;
    }
    transition_to(room, Phase::VoteResult, config);
}

/// Close the vote-result phase: finish the game on a win, otherwise
/// reset round bookkeeping and start the next hint round.
pub fn complete_vote_result(room: &mut Room, config: &GameConfig) -> Option<GameEndSummary> {
    let winner = {
        let game = room.game.as_ref()?;
        if game.phase != Phase::VoteResult {
            return None;
        }
        engine::check_win_condition(&room.players, game)
    };

    match winner {
        Some(winner) => {
            if let Some(game) = room.game.as_mut() {
                game.winner = Some(winner);
            }
            transition_to(room, Phase::GameOver, config);
            room.status = RoomStatus::Ended;
            info!(room = %room.id, ?winner, "game over");
            summarize(room)
        }
        None => {
            if let Some(game) = room.game.as_mut() {
                game.round_number += 1;
                game.hints.clear();
                game.votes.clear();
                game.eliminated_id = None;
            }
            for player in &mut room.players {
                player.has_voted = false;
            }
            transition_to(room, Phase::HintRound, config);
            None
        }
    }
}

/// End a live game by decree, outside the transition graph.
///
/// Used when the imposter vanishes mid-game and when a room invariant
/// breaks. No-op if the game is already over.
pub fn force_game_end(room: &mut Room, winner: Winner) -> Option<GameEndSummary> {
    {
        let game = room.game.as_mut()?;
        if game.is_over() {
            return None;
        }
        game.winner = Some(winner);
        game.phase = Phase::GameOver;
        game.phase_time_left = 0;
    }
    room.status = RoomStatus::Ended;
    room.cancel_ticker();
    info!(room = %room.id, ?winner, "game force-ended");
    summarize(room)
}

/// Build the stats summary for the room's finished game.
pub fn summarize(room: &Room) -> Option<GameEndSummary> {
    let game = room.game.as_ref()?;
    Some(GameEndSummary {
        game_id: game.game_id,
        winner: game.winner?,
        room_id: room.id.clone(),
        category: game.category.clone(),
        players: room
            .players
            .iter()
            .map(|p| PlayerOutcome {
                session_id: p.session_id.clone(),
                name: p.name.clone(),
                role: p.role,
                eliminated: p.eliminated,
            })
            .collect(),
        duration_secs: room.game_duration_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{GameMode, GameState, Player, Role, SessionId};

    fn sid(s: &str) -> SessionId {
        SessionId::from_string(s)
    }

    fn player(s: &str) -> Player {
        Player::new(sid(s), s.to_uppercase(), "fox")
    }

    /// Room with a started game in RoleReveal, imposter p2.
    fn playing_room(names: &[&str]) -> Room {
        let config = GameConfig::default();
        let mut room = Room::new(
            "AB12CD".into(),
            "Room".into(),
            None,
            None,
            GameMode::Classic,
            player(names[0]),
        );
        for name in &names[1..] {
            room.admit(player(name), None, 8).unwrap();
        }
        for p in &mut room.players {
            p.role = Some(if p.session_id == sid("p2") {
                Role::Imposter
            } else {
                Role::Citizen
            });
        }
        let order: Vec<SessionId> = names.iter().map(|s| sid(s)).collect();
        let game = GameState::new("Animals".into(), "Cat".into(), None, sid("p2"), order);
        room.game = Some(game);
        transition_to(&mut room, Phase::RoleReveal, &config);
        room.status = RoomStatus::Playing;
        room
    }

    fn game_phase(room: &Room) -> Phase {
        room.game.as_ref().unwrap().phase
    }

    #[test]
    fn test_role_reveal_counts_down_into_hint_round() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3"]);
        assert_eq!(game_phase(&room), Phase::RoleReveal);

        for _ in 0..config.role_reveal_secs {
            tick_room(&mut room, &config);
        }
        assert_eq!(game_phase(&room), Phase::HintRound);
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.current_turn_index, 0);
        assert_eq!(game.turn_time_left, config.hint_turn_secs);
    }

    #[test]
    fn test_turn_timeout_records_sentinel_and_advances() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3"]);
        for _ in 0..config.role_reveal_secs {
            tick_room(&mut room, &config);
        }

        for _ in 0..config.hint_turn_secs {
            tick_room(&mut room, &config);
        }
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.hints.get(&sid("p1")).unwrap(), &vec![TIMEOUT_HINT.to_string()]);
        assert_eq!(game.current_turn_index, 1);
    }

    #[test]
    fn test_hint_rounds_then_discussion() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3"]);
        for _ in 0..config.role_reveal_secs {
            tick_room(&mut room, &config);
        }

        // Nobody ever submits: every turn times out. Two sub-rounds of
        // three turns each, then discussion.
        for _ in 0..(config.hint_turn_secs * 6) {
            tick_room(&mut room, &config);
        }
        assert_eq!(game_phase(&room), Phase::Discussion);
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.round_number, config.hint_rounds);
        for p in ["p1", "p2", "p3"] {
            assert_eq!(game.hints.get(&sid(p)).unwrap().len(), 2);
        }
    }

    #[test]
    fn test_voting_decisive_then_next_round() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3", "p4"]);
        {
            let game = room.game.as_mut().unwrap();
            game.phase = Phase::Voting;
            game.phase_time_left = 1;
            // p3 is voted out (p3 is a citizen; game continues).
            game.votes.insert(sid("p1"), sid("p3"));
            game.votes.insert(sid("p2"), sid("p3"));
            game.votes.insert(sid("p3"), sid("p1"));
        }

        tick_room(&mut room, &config);
        assert_eq!(game_phase(&room), Phase::VoteResult);
        assert_eq!(
            room.game.as_ref().unwrap().eliminated_id,
            Some(sid("p3"))
        );
        assert!(room.player(&sid("p3")).unwrap().eliminated);

        // VoteResult expires; citizens 2 > 1 and imposter alive, so a
        // fresh hint round begins with cleared bookkeeping.
        room.game.as_mut().unwrap().phase_time_left = 1;
        let outcome = tick_room(&mut room, &config);
        assert!(outcome.ended.is_none());
        assert_eq!(game_phase(&room), Phase::HintRound);
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.round_number, 2);
        assert!(game.votes.is_empty());
        assert!(game.hints.is_empty());
        assert_eq!(game.eliminated_id, None);
    }

    #[test]
    fn test_tie_eliminates_nobody() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3"]);
        {
            let game = room.game.as_mut().unwrap();
            game.phase = Phase::Voting;
            game.phase_time_left = 1;
            game.votes.insert(sid("p1"), sid("p2"));
            game.votes.insert(sid("p2"), sid("p3"));
            game.votes.insert(sid("p3"), sid("p1"));
        }

        tick_room(&mut room, &config);
        assert_eq!(game_phase(&room), Phase::VoteResult);
        assert_eq!(room.game.as_ref().unwrap().eliminated_id, None);
        assert!(room.players.iter().all(|p| !p.eliminated));
    }

    #[test]
    fn test_imposter_caught_ends_game() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3", "p4"]);
        {
            let game = room.game.as_mut().unwrap();
            game.phase = Phase::Voting;
            game.phase_time_left = 1;
            game.votes.insert(sid("p1"), sid("p2"));
            game.votes.insert(sid("p3"), sid("p2"));
            game.votes.insert(sid("p4"), sid("p2"));
        }

        tick_room(&mut room, &config);
        room.game.as_mut().unwrap().phase_time_left = 1;
        let outcome = tick_room(&mut room, &config);

        assert!(outcome.stop);
        let summary = outcome.ended.expect("game should have ended");
        assert_eq!(summary.winner, Winner::Citizens);
        assert_eq!(game_phase(&room), Phase::GameOver);
        assert_eq!(room.status, RoomStatus::Ended);
        assert_eq!(
            room.game.as_ref().unwrap().winner,
            Some(Winner::Citizens)
        );
    }

    #[test]
    fn test_imposter_wins_at_one_citizen() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3"]);
        {
            let game = room.game.as_mut().unwrap();
            game.phase = Phase::Voting;
            game.phase_time_left = 1;
            // p1 and p2 gang up on p3 (citizen); one citizen remains.
            game.votes.insert(sid("p1"), sid("p3"));
            game.votes.insert(sid("p2"), sid("p3"));
        }

        tick_room(&mut room, &config);
        room.game.as_mut().unwrap().phase_time_left = 1;
        let outcome = tick_room(&mut room, &config);

        let summary = outcome.ended.expect("game should have ended");
        assert_eq!(summary.winner, Winner::Imposter);
    }

    #[test]
    fn test_force_game_end_is_idempotent() {
        let mut room = playing_room(&["p1", "p2", "p3"]);
        let first = force_game_end(&mut room, Winner::Citizens);
        assert!(first.is_some());
        assert_eq!(room.status, RoomStatus::Ended);

        let second = force_game_end(&mut room, Winner::Citizens);
        assert!(second.is_none());
    }

    #[test]
    fn test_eliminated_speaker_is_skipped() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3"]);
        for _ in 0..config.role_reveal_secs {
            tick_room(&mut room, &config);
        }
        room.player_mut(&sid("p2")).unwrap().eliminated = true;

        // p1's turn times out; p2 is skipped, cursor lands on p3.
        for _ in 0..config.hint_turn_secs {
            tick_room(&mut room, &config);
        }
        assert_eq!(room.game.as_ref().unwrap().current_turn_index, 2);
    }

    #[test]
    fn test_illegal_transition_leaves_state_unchanged() {
        let config = GameConfig::default();
        let mut room = playing_room(&["p1", "p2", "p3"]);
        transition_to(&mut room, Phase::GameOver, &config);
        assert_eq!(game_phase(&room), Phase::RoleReveal);
    }
}
