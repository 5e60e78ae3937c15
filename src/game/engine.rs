//! Pure Game Engine
//!
//! Stateless validators and reducers driving a round. Every function is
//! deterministic given its inputs; randomness comes in through a
//! [`RandomSource`] and wall-clock time never appears. Nothing here
//! mutates its input.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::GameConfig;
use crate::game::phase::Phase;
use crate::game::rng::RandomSource;
use crate::game::state::{GameMode, GameState, Player, SessionId, Winner};

/// Hints longer than this are truncated.
pub const HINT_MAX_LEN: usize = 50;

/// Sentinel recorded when a speaker submits an empty hint.
pub const EMPTY_HINT: &str = "(Empty)";

/// Sentinel recorded when a speaker's turn timer expires.
pub const TIMEOUT_HINT: &str = "(Timed out)";

// =============================================================================
// ERRORS
// =============================================================================

/// Vote validation errors, in the order validation applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VoteError {
    /// No game exists in this room.
    #[error("game not started")]
    GameNotStarted,

    /// The game is not in the voting phase.
    #[error("wrong phase")]
    WrongPhase,

    /// Voter and target are the same session.
    #[error("cannot vote for yourself")]
    CannotVoteSelf,

    /// Target is missing from the room or already eliminated.
    #[error("invalid target")]
    InvalidTarget,

    /// Reserved for future rules; validation never raises it today
    /// (vote overwrite is allowed, last write wins).
    #[error("already voted")]
    AlreadyVoted,
}

/// Engine errors outside vote validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The requested phase edge does not exist in the transition graph.
    #[error("invalid phase transition")]
    InvalidTransition,
}

// =============================================================================
// VOTING
// =============================================================================

/// Validate a vote against the current game and player list.
///
/// Checks in order: game exists, phase is Voting, voter is not the
/// target, target exists and is not eliminated. Re-voting is legal, so a
/// prior vote by the same voter is never an error.
pub fn validate_vote(
    game: Option<&GameState>,
    players: &[Player],
    voter: &SessionId,
    target: &SessionId,
) -> Result<(), VoteError> {
    let game = game.ok_or(VoteError::GameNotStarted)?;
    if game.phase != Phase::Voting {
        return Err(VoteError::WrongPhase);
    }
    if voter == target {
        return Err(VoteError::CannotVoteSelf);
    }
    let target_player = players
        .iter()
        .find(|p| &p.session_id == target)
        .ok_or(VoteError::InvalidTarget)?;
    if target_player.eliminated {
        return Err(VoteError::InvalidTarget);
    }
    Ok(())
}

/// Return a vote map equal to `votes` with `voter -> target` set.
pub fn apply_vote(
    votes: &BTreeMap<SessionId, SessionId>,
    voter: &SessionId,
    target: &SessionId,
) -> BTreeMap<SessionId, SessionId> {
    let mut next = votes.clone();
    next.insert(voter.clone(), target.clone());
    next
}

/// Tally votes and return the eliminated session, if the vote is decisive.
///
/// The unique top target wins only with strictly more votes than the
/// runner-up; a tie (or no votes at all) eliminates nobody.
pub fn calculate_eliminated(votes: &BTreeMap<SessionId, SessionId>) -> Option<SessionId> {
    if votes.is_empty() {
        return None;
    }

    let mut tally: BTreeMap<&SessionId, u32> = BTreeMap::new();
    for target in votes.values() {
        *tally.entry(target).or_insert(0) += 1;
    }

    let mut counts: Vec<(&SessionId, u32)> = tally.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    match counts.as_slice() {
        [] => None,
        [(top, _)] => Some((*top).clone()),
        [(top, top_count), (_, runner_up), ..] if top_count > runner_up => Some((*top).clone()),
        _ => None,
    }
}

/// Whether every non-eliminated player has cast a vote.
pub fn all_active_voted(players: &[Player], votes: &BTreeMap<SessionId, SessionId>) -> bool {
    players
        .iter()
        .filter(|p| p.is_active())
        .all(|p| votes.contains_key(&p.session_id))
}

// =============================================================================
// WORD SELECTION
// =============================================================================

/// Words drawn for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPair {
    /// The word citizens share.
    pub citizen: String,
    /// The imposter's decoy word (Blind mode only).
    pub imposter: Option<String>,
}

/// Draw the secret word(s) for a game.
///
/// Classic draws a single word. Blind draws a citizen word, then an
/// imposter word guaranteed to sit at a different index; a single-word
/// list degenerates to the same word twice, and a two-word list always
/// yields the other word.
pub fn select_words(
    mode: GameMode,
    word_list: &[&str],
    rng: &mut dyn RandomSource,
) -> WordPair {
    debug_assert!(!word_list.is_empty(), "word list must not be empty");

    let citizen_idx = draw_index(word_list.len(), rng);
    let citizen = word_list[citizen_idx].to_string();

    let imposter = match mode {
        GameMode::Classic => None,
        GameMode::Blind => {
            let idx = if word_list.len() <= 1 {
                citizen_idx
            } else {
                // Uniform over the remaining indices; skipping the citizen
                // slot keeps the draw a single call even when the source
                // repeats values.
                let mut idx = draw_index(word_list.len() - 1, rng);
                if idx >= citizen_idx {
                    idx += 1;
                }
                idx
            };
            Some(word_list[idx].to_string())
        }
    };

    WordPair { citizen, imposter }
}

// =============================================================================
// TURN ORDER
// =============================================================================

/// Choose the speaking order for hint rounds.
///
/// The first speaker is drawn by weighted sampling where the imposter
/// carries `imposter_weight` and everyone else 1.0 (the imposter speaking
/// first gives the game away too easily). The remaining players are
/// Fisher-Yates shuffled with the same source.
pub fn select_turn_order(
    players: &[SessionId],
    imposter: &SessionId,
    imposter_weight: f64,
    rng: &mut dyn RandomSource,
) -> Vec<SessionId> {
    if players.is_empty() {
        return Vec::new();
    }

    let weights: Vec<f64> = players
        .iter()
        .map(|id| if id == imposter { imposter_weight } else { 1.0 })
        .collect();
    let total: f64 = weights.iter().sum();

    let mut r = rng.next_unit() * total;
    let mut first = players.len() - 1;
    for (i, w) in weights.iter().enumerate() {
        r -= w;
        if r <= 0.0 {
            first = i;
            break;
        }
    }

    let mut rest: Vec<SessionId> = players
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != first)
        .map(|(_, id)| id.clone())
        .collect();
    shuffle(&mut rest, rng);

    let mut order = Vec::with_capacity(players.len());
    order.push(players[first].clone());
    order.extend(rest);
    order
}

/// Index of the first non-eliminated speaker at or after `from`, if any.
pub fn next_active_turn(
    turn_order: &[SessionId],
    players: &[Player],
    from: usize,
) -> Option<usize> {
    (from..turn_order.len()).find(|&i| {
        let id = &turn_order[i];
        players.iter().any(|p| &p.session_id == id && p.is_active())
    })
}

// =============================================================================
// PHASE TRANSITIONS
// =============================================================================

/// Apply a phase transition, returning the successor state.
///
/// Rejects edges outside the transition graph. Entering Voting clears the
/// vote map; entering HintRound rewinds the turn cursor and turn timer;
/// entering GameOver leaves every other field untouched (the winner was
/// already set by the caller).
pub fn apply_phase_transition(
    state: &GameState,
    target: Phase,
    config: &GameConfig,
) -> Result<GameState, EngineError> {
    if !state.phase.can_transition(target) {
        return Err(EngineError::InvalidTransition);
    }

    let mut next = state.clone();
    next.phase = target;
    next.phase_time_left = target.duration_secs(config);

    match target {
        Phase::Voting => {
            next.votes.clear();
        }
        Phase::HintRound => {
            next.current_turn_index = 0;
            next.turn_time_left = config.hint_turn_secs;
        }
        _ => {}
    }

    Ok(next)
}

// =============================================================================
// WIN CONDITION
// =============================================================================

/// Evaluate the win condition.
///
/// Citizens win the moment the imposter is eliminated; the imposter wins
/// once at most one citizen remains active. Returns None while the game
/// should continue.
pub fn check_win_condition(players: &[Player], game: &GameState) -> Option<Winner> {
    let imposter_eliminated = players
        .iter()
        .any(|p| p.session_id == game.imposter_id && p.eliminated);
    if imposter_eliminated {
        return Some(Winner::Citizens);
    }

    let active_citizens = players
        .iter()
        .filter(|p| p.session_id != game.imposter_id && p.is_active())
        .count();
    if active_citizens <= 1 {
        return Some(Winner::Imposter);
    }

    None
}

// =============================================================================
// HINTS
// =============================================================================

/// Normalize a submitted hint: trim, truncate to [`HINT_MAX_LEN`]
/// characters, and substitute the empty sentinel.
pub fn normalize_hint(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return EMPTY_HINT.to_string();
    }
    trimmed.chars().take(HINT_MAX_LEN).collect()
}

/// Whether a hint gives away the secret word (case-insensitive match).
pub fn hint_matches_secret(hint: &str, secret: &str) -> bool {
    hint.trim().eq_ignore_ascii_case(secret.trim())
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

/// Uniform index in [0, n), clamped against a source returning exactly 1.0.
fn draw_index(n: usize, rng: &mut dyn RandomSource) -> usize {
    debug_assert!(n > 0);
    ((rng.next_unit() * n as f64) as usize).min(n - 1)
}

/// Unbiased Fisher-Yates shuffle driven by the injected source.
fn shuffle(slice: &mut [SessionId], rng: &mut dyn RandomSource) {
    for i in (1..slice.len()).rev() {
        let j = draw_index(i + 1, rng);
        slice.swap(i, j);
    }
}
