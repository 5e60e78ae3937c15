//! Room Store
//!
//! Process-local registry of rooms plus the session-to-room index. The
//! store hands out `Arc<RwLock<Room>>` so all room mutation is serialized
//! on the per-room lock; the store's own maps are touched briefly and
//! never across an await on a room.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;

use crate::game::state::{GameMode, Player, SessionId};
use crate::room::room::{Room, RoomError, RoomId, ROOM_ID_LEN};

const ROOM_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Registry of all live rooms.
pub struct RoomStore {
    /// Maximum players per room.
    max_players: usize,
    /// Room id -> room.
    rooms: RwLock<HashMap<RoomId, Arc<RwLock<Room>>>>,
    /// Session id -> the room it is in.
    by_session: RwLock<HashMap<SessionId, RoomId>>,
}

impl RoomStore {
    /// Create an empty store.
    pub fn new(max_players: usize) -> Self {
        Self {
            max_players,
            rooms: RwLock::new(HashMap::new()),
            by_session: RwLock::new(HashMap::new()),
        }
    }

    /// Create a room owned by `owner` and index the owner's session.
    pub async fn create_room(
        &self,
        name: String,
        password: Option<String>,
        category: Option<String>,
        mode: GameMode,
        owner: Player,
    ) -> Arc<RwLock<Room>> {
        let owner_session = owner.session_id.clone();
        let mut rooms = self.rooms.write().await;

        // Collision-retry: the id space is 36^6, collisions are rare but
        // the loop makes them harmless.
        let id = loop {
            let candidate = generate_room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Arc::new(RwLock::new(Room::new(
            id.clone(),
            name,
            password,
            category,
            mode,
            owner,
        )));
        rooms.insert(id.clone(), room.clone());
        drop(rooms);

        self.by_session.write().await.insert(owner_session, id);
        room
    }

    /// Join an existing room, enforcing password, status, and capacity.
    pub async fn join_room(
        &self,
        room_id: &str,
        password: Option<&str>,
        player: Player,
    ) -> Result<Arc<RwLock<Room>>, RoomError> {
        let session_id = player.session_id.clone();
        let room = self.get(room_id).await.ok_or(RoomError::RoomNotFound)?;

        room.write()
            .await
            .admit(player, password, self.max_players)?;

        self.by_session
            .write()
            .await
            .insert(session_id, room_id.to_string());
        Ok(room)
    }

    /// Look up a room by id.
    pub async fn get(&self, room_id: &str) -> Option<Arc<RwLock<Room>>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// The room a session currently belongs to, if any.
    pub async fn room_of(&self, session_id: &SessionId) -> Option<Arc<RwLock<Room>>> {
        let room_id = self.by_session.read().await.get(session_id).cloned()?;
        self.get(&room_id).await
    }

    /// Drop the session-to-room binding for a departed session.
    pub async fn unbind_session(&self, session_id: &SessionId) {
        self.by_session.write().await.remove(session_id);
    }

    /// Remove a room entirely.
    pub async fn remove_room(&self, room_id: &str) {
        self.rooms.write().await.remove(room_id);
    }

    /// Snapshot of every live room, for listings.
    pub async fn all_rooms(&self) -> Vec<Arc<RwLock<Room>>> {
        self.rooms.read().await.values().cloned().collect()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

/// Generate a 6-character upper-alphanumeric room id.
fn generate_room_id() -> RoomId {
    let mut rng = rand::thread_rng();
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_CHARSET[rng.gen_range(0..ROOM_ID_CHARSET.len())] as char)
        .collect()
}
