//! Server and Game Configuration
//!
//! Two layers: `ServerConfig` covers the network surface (bind address,
//! connection limits), `GameConfig` covers the rules every room plays by
//! (player limits, phase timings, speaker weighting). Both have sane
//! defaults and can be overridden from the environment.

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Idle timeout before a silent connection is swept.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.bind_addr = parsed;
            }
        }
        if let Some(n) = env_usize("MAX_CONNECTIONS") {
            config.max_connections = n;
        }
        config
    }
}

/// Game rules shared by every room.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Minimum players required to start a game.
    pub min_players: usize,
    /// Maximum players in a room.
    pub max_players: usize,
    /// Role reveal duration (seconds).
    pub role_reveal_secs: u32,
    /// Per-speaker turn duration during hint rounds (seconds).
    pub hint_turn_secs: u32,
    /// Number of hint sub-rounds before the first discussion.
    pub hint_rounds: u32,
    /// Discussion duration (seconds).
    pub discussion_secs: u32,
    /// Voting duration (seconds).
    pub voting_secs: u32,
    /// Vote result display duration (seconds).
    pub vote_result_secs: u32,
    /// First-speaker sampling weight for the imposter (citizens weigh 1.0).
    pub imposter_first_speaker_weight: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 8,
            role_reveal_secs: 5,
            hint_turn_secs: 30,
            hint_rounds: 2,
            discussion_secs: 90,
            voting_secs: 30,
            vote_result_secs: 5,
            imposter_first_speaker_weight: 0.5,
        }
    }
}

impl GameConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_usize("MIN_PLAYERS") {
            config.min_players = n;
        }
        if let Some(n) = env_usize("MAX_PLAYERS") {
            config.max_players = n;
        }
        if let Some(n) = env_u32("ROLE_REVEAL_TIME") {
            config.role_reveal_secs = n;
        }
        if let Some(n) = env_u32("HINT_TURN_TIME") {
            config.hint_turn_secs = n;
        }
        if let Some(n) = env_u32("HINT_ROUNDS") {
            config.hint_rounds = n;
        }
        if let Some(n) = env_u32("DISCUSSION_TIME") {
            config.discussion_secs = n;
        }
        if let Some(n) = env_u32("VOTING_TIME") {
            config.voting_secs = n;
        }
        if let Some(n) = env_u32("VOTE_RESULT_TIME") {
            config.vote_result_secs = n;
        }
        if let Ok(w) = std::env::var("IMPOSTER_FIRST_SPEAKER_WEIGHT") {
            if let Ok(parsed) = w.parse() {
                config.imposter_first_speaker_weight = parsed;
            }
        }
        config
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.max_players, 8);
        assert_eq!(config.hint_rounds, 2);
        assert!((config.imposter_first_speaker_weight - 0.5).abs() < f64::EPSILON);
    }
}
