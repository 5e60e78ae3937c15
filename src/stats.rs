//! Stats Persistence Collaborator
//!
//! The core hands a finished game to a `StatsSink` and moves on; sink
//! failures never affect gameplay. Recording must be idempotent on the
//! game id because a forced end (imposter disconnect) can race the
//! scheduler's own end-of-game path.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::state::{Role, SessionId, Winner};
use crate::room::room::RoomId;

/// Summary of a finished game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEndSummary {
    /// Unique game id; the idempotency key.
    pub game_id: Uuid,
    /// Winning side.
    pub winner: Winner,
    /// Room the game was played in.
    pub room_id: RoomId,
    /// Word category.
    pub category: String,
    /// Per-player outcome.
    pub players: Vec<PlayerOutcome>,
    /// Wall-clock game length.
    pub duration_secs: Option<u64>,
}

/// One player's slice of a game summary.
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerOutcome {
    pub session_id: SessionId,
    pub name: String,
    pub role: Option<Role>,
    pub eliminated: bool,
}

/// Stats persistence collaborator.
#[async_trait]
pub trait StatsSink: Send + Sync {
    /// Record a finished game. Implementations must deduplicate on
    /// `summary.game_id` and swallow their own failures.
    async fn record_game_end(&self, summary: GameEndSummary);
}

/// Default sink: structured log line per game, deduplicated in memory.
#[derive(Default)]
pub struct LoggingStatsSink {
    // TODO: evict recorded ids once the persistence layer takes over
    // long-term storage with its own retention.
    recorded: Mutex<HashSet<Uuid>>,
}

impl LoggingStatsSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a game id has been recorded (for tests).
    pub fn has_recorded(&self, game_id: &Uuid) -> bool {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(game_id)
    }
}

#[async_trait]
impl StatsSink for LoggingStatsSink {
    async fn record_game_end(&self, summary: GameEndSummary) {
        {
            let mut recorded = self.recorded.lock().unwrap_or_else(|e| e.into_inner());
            if !recorded.insert(summary.game_id) {
                debug!(game_id = %summary.game_id, "duplicate game end ignored");
                return;
            }
        }
        info!(
            game_id = %summary.game_id,
            room_id = %summary.room_id,
            winner = ?summary.winner,
            category = %summary.category,
            players = summary.players.len(),
            duration_secs = ?summary.duration_secs,
            "game ended"
        );
    }
}
