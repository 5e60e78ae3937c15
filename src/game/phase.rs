//! Game Phases
//!
//! The phase universe and its legal transitions. A game walks the graph
//!
//! ```text
//! Lobby -> RoleReveal -> HintRound -> Discussion -> Voting -> VoteResult
//!              ^                                                  |
//!              |                                                  v
//!              +--------------- (next round) <------------- VoteResult
//!                                                                |
//!                                                                v
//! Lobby <------------------ (play again) ------------------- GameOver
//! ```
//!
//! Lobby is initial, GameOver is terminal within a single match.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// A phase of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Waiting for the owner to start the game.
    Lobby,
    /// Players privately learn their role and word.
    RoleReveal,
    /// Players give hints one turn at a time.
    HintRound,
    /// Open discussion before the vote.
    Discussion,
    /// Players cast votes.
    Voting,
    /// Vote outcome is displayed.
    VoteResult,
    /// A side has won; terminal within one match.
    GameOver,
}

impl Phase {
    /// Whether the edge `self -> to` exists in the transition graph.
    pub fn can_transition(self, to: Phase) -> bool {
        matches!(
            (self, to),
            (Phase::Lobby, Phase::RoleReveal)
                | (Phase::RoleReveal, Phase::HintRound)
                | (Phase::HintRound, Phase::Discussion)
                | (Phase::Discussion, Phase::Voting)
                | (Phase::Voting, Phase::VoteResult)
                | (Phase::VoteResult, Phase::HintRound)
                | (Phase::VoteResult, Phase::GameOver)
                | (Phase::GameOver, Phase::Lobby)
        )
    }

    /// The phase the timer advances to on expiry, where the graph is linear.
    ///
    /// VoteResult branches on the win condition and is resolved by the
    /// scheduler, not here.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::RoleReveal => Some(Phase::HintRound),
            Phase::HintRound => Some(Phase::Discussion),
            Phase::Discussion => Some(Phase::Voting),
            Phase::Voting => Some(Phase::VoteResult),
            Phase::Lobby | Phase::VoteResult | Phase::GameOver => None,
        }
    }

    /// Timer duration for this phase in seconds.
    ///
    /// HintRound is timed per speaker turn, so its duration is the turn
    /// time. Lobby and GameOver are untimed.
    pub fn duration_secs(self, config: &GameConfig) -> u32 {
        match self {
            Phase::Lobby | Phase::GameOver => 0,
            Phase::RoleReveal => config.role_reveal_secs,
            Phase::HintRound => config.hint_turn_secs,
            Phase::Discussion => config.discussion_secs,
            Phase::Voting => config.voting_secs,
            Phase::VoteResult => config.vote_result_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Phase; 7] = [
        Phase::Lobby,
        Phase::RoleReveal,
        Phase::HintRound,
        Phase::Discussion,
        Phase::Voting,
        Phase::VoteResult,
        Phase::GameOver,
    ];

    #[test]
    fn test_legal_edges() {
        assert!(Phase::Lobby.can_transition(Phase::RoleReveal));
        assert!(Phase::RoleReveal.can_transition(Phase::HintRound));
        assert!(Phase::HintRound.can_transition(Phase::Discussion));
        assert!(Phase::Discussion.can_transition(Phase::Voting));
        assert!(Phase::Voting.can_transition(Phase::VoteResult));
        assert!(Phase::VoteResult.can_transition(Phase::HintRound));
        assert!(Phase::VoteResult.can_transition(Phase::GameOver));
        assert!(Phase::GameOver.can_transition(Phase::Lobby));
    }

    #[test]
    fn test_edge_count_is_exactly_eight() {
        let mut count = 0;
        for from in ALL {
            for to in ALL {
                if from.can_transition(to) {
                    count += 1;
                }
            }
        }
        assert_eq!(count, 8);
    }

    #[test]
    fn test_no_self_edges() {
        for phase in ALL {
            assert!(!phase.can_transition(phase));
        }
    }

    #[test]
    fn test_next_follows_the_linear_path() {
        assert_eq!(Phase::RoleReveal.next(), Some(Phase::HintRound));
        assert_eq!(Phase::HintRound.next(), Some(Phase::Discussion));
        assert_eq!(Phase::Discussion.next(), Some(Phase::Voting));
        assert_eq!(Phase::Voting.next(), Some(Phase::VoteResult));
        // Branch points and endpoints resolve elsewhere.
        assert_eq!(Phase::Lobby.next(), None);
        assert_eq!(Phase::VoteResult.next(), None);
        assert_eq!(Phase::GameOver.next(), None);
    }

    #[test]
    fn test_untimed_phases() {
        let config = GameConfig::default();
        assert_eq!(Phase::Lobby.duration_secs(&config), 0);
        assert_eq!(Phase::GameOver.duration_secs(&config), 0);
    }

    #[test]
    fn test_timed_phases_use_config() {
        let config = GameConfig {
            voting_secs: 42,
            ..Default::default()
        };
        assert_eq!(Phase::Voting.duration_secs(&config), 42);
    }

    #[test]
    fn test_serde_names_are_stable() {
        let json = serde_json::to_string(&Phase::RoleReveal).unwrap();
        assert_eq!(json, "\"ROLE_REVEAL\"");
        let json = serde_json::to_string(&Phase::HintRound).unwrap();
        assert_eq!(json, "\"HINT_ROUND\"");
    }
}
