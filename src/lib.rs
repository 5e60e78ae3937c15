//! # Word Imposter Game Server
//!
//! Authoritative real-time server for a social-deduction word game:
//! one hidden imposter among a group of citizens who share a secret
//! word, unmasked (or not) across hint rounds, discussions, and votes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  WORD IMPOSTER SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/            - Pure engine (deterministic)              │
//! │  ├── phase.rs     - Phase graph and durations                │
//! │  ├── state.rs     - Game state, players, ids                 │
//! │  ├── engine.rs    - Validators, reducers, tallying           │
//! │  ├── words.rs     - Word catalog                             │
//! │  └── rng.rs       - Injectable randomness                    │
//! │                                                              │
//! │  room/            - Rooms, store, presence                   │
//! │  scheduler.rs     - 1 Hz phase driver per playing room       │
//! │  orchestrator.rs  - Event dispatch and handlers              │
//! │                                                              │
//! │  network/         - Transport (non-deterministic)            │
//! │  ├── server.rs    - WebSocket accept loop                    │
//! │  ├── protocol.rs  - Tagged JSON events                       │
//! │  ├── session.rs   - Sessions and fanout                      │
//! │  ├── view.rs      - Role-tailored projections                │
//! │  ├── auth.rs      - JWT handshake validation                 │
//! │  └── rate_limit.rs- Per-event sliding windows                │
//! │                                                              │
//! │  stats.rs         - Game-end persistence collaborator        │
//! │  friends.rs       - Friend/invite collaborator               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Guarantee
//!
//! The server is the single source of truth. Clients only ever receive
//! projections computed for them individually: the Classic-mode imposter
//! never sees the word, citizens never see who the imposter is, and the
//! room password never crosses the wire.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod friends;
pub mod game;
pub mod network;
pub mod orchestrator;
pub mod room;
pub mod scheduler;
pub mod stats;

// Re-export commonly used types
pub use config::{GameConfig, ServerConfig};
pub use game::{GameMode, GameState, Phase, Player, Role, SessionId, UserId, Winner};
pub use network::{AuthConfig, ClientEvent, ErrorCode, GameServer, ServerEvent};
pub use orchestrator::Orchestrator;
pub use room::{Room, RoomStatus, RoomStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scheduler tick rate (Hz). One logical ticker per playing room.
pub const TICK_RATE: u32 = 1;
