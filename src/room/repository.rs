use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use super::models::Room;
use crate::quiz::{Quiz, DEFAULT_TIMEOUT_SECS};

/// A room behind its own lock; every mutation on one room is serialized
pub type SharedRoom = Arc<Mutex<Room>>;

/// Whether `get_or_create` built a fresh room or handed back an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomLookup {
    Created,
    Reused,
}

/// Trait for room registry operations
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Returns the room for `room_id`, creating it if absent. An existing room
    /// gets the new quiz set and encryption mode and is reset.
    async fn get_or_create(
        &self,
        room_id: &str,
        name: &str,
        quiz_set: Vec<Quiz>,
        encryption_mode: Option<String>,
    ) -> (SharedRoom, RoomLookup);

    async fn get(&self, room_id: &str) -> Option<SharedRoom>;

    async fn room_count(&self) -> usize;
}

/// Process-local room registry
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<String, SharedRoom>>,
    default_timeout: u32,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl InMemoryRoomRepository {
    /// Creates an empty registry; new rooms advertise `default_timeout`
    pub fn new(default_timeout: u32) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            default_timeout,
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, quiz_set))]
    async fn get_or_create(
        &self,
        room_id: &str,
        name: &str,
        quiz_set: Vec<Quiz>,
        encryption_mode: Option<String>,
    ) -> (SharedRoom, RoomLookup) {
        let shared = {
            let mut rooms = self.rooms.write().await;
            if let Some(room) = rooms.get(room_id) {
                room.clone()
            } else {
                let quiz_count = quiz_set.len();
                let mut room = Room::new(
                    room_id.to_string(),
                    name.to_string(),
                    quiz_set,
                    encryption_mode,
                );
                room.set_default_timeout(self.default_timeout);
                let shared = Arc::new(Mutex::new(room));
                rooms.insert(room_id.to_string(), shared.clone());
                info!(room_id = %room_id, quiz_count = quiz_count, "Room created");
                return (shared, RoomLookup::Created);
            }
        };

        // Reuse work runs under the room lock only, so other rooms are not blocked
        {
            let mut room = shared.lock().await;
            room.replace_quiz_set(quiz_set);
            room.set_encryption_mode(encryption_mode);
            room.reset();
        }
        debug!(room_id = %room_id, "Room reused");
        (shared, RoomLookup::Reused)
    }

    async fn get(&self, room_id: &str) -> Option<SharedRoom> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
