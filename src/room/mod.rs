//! Room and Session-Index Module
//!
//! - `room`: a single room's players, game, and ticker handle
//! - `store`: the process-local room registry and session index
//! - `presence`: online-user tracking across multiple sessions

pub mod presence;
#[allow(clippy::module_inception)]
pub mod room;
pub mod store;

pub use presence::PresenceIndex;
pub use room::{Room, RoomError, RoomId, RoomStatus, ROOM_ID_LEN};
pub use store::RoomStore;
