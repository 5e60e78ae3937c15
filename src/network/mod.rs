//! Network Layer
//!
//! WebSocket server, wire protocol, sessions, auth, rate limiting, and
//! view projections. This layer is **non-deterministic**; all game logic
//! runs through `game/`.

pub mod auth;
pub mod protocol;
pub mod rate_limit;
pub mod server;
pub mod session;
pub mod view;

pub use auth::{authenticate, validate_token, AuthConfig, AuthError, Claims};
pub use protocol::{ChatMessage, ClientEvent, ErrorCode, ServerEvent};
pub use rate_limit::{EventKind, RateLimiter, SlidingWindowLimiter};
pub use server::{GameServer, GameServerError};
pub use session::{AuthBinding, Profile, Session, SessionRegistry};
pub use view::{GameStateView, PlayerView, RoomListEntry, RoomView};
