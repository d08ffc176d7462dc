use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::transport::{ChannelTransport, TransportError};

/// Live connections, addressable by participant and by room channel
#[async_trait]
pub trait ConnectionManager: ChannelTransport {
    /// Registers a connection and subscribes it to the room's channel. A newer
    /// connection for the same participant replaces the old one.
    async fn add_connection(
        &self,
        room_id: &str,
        participant_id: &str,
        sender: mpsc::UnboundedSender<String>,
    ) -> Uuid;

    /// Removes the connection only if `connection_id` is still the current one
    async fn remove_connection(&self, participant_id: &str, connection_id: Uuid);
}

struct Connection {
    id: Uuid,
    room_id: String,
    sender: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct ConnectionState {
    // participant id -> connection
    connections: HashMap<String, Connection>,
    // room id -> participant ids
    channels: HashMap<String, HashSet<String>>,
}

impl ConnectionState {
    fn leave_channel(&mut self, room_id: &str, participant_id: &str) {
        if let Some(members) = self.channels.get_mut(room_id) {
            members.remove(participant_id);
            if members.is_empty() {
                self.channels.remove(room_id);
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryConnectionManager {
    state: RwLock<ConnectionState>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(
        &self,
        room_id: &str,
        participant_id: &str,
        sender: mpsc::UnboundedSender<String>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.write().await;

        let previous = state.connections.insert(
            participant_id.to_string(),
            Connection {
                id,
                room_id: room_id.to_string(),
                sender,
            },
        );
        if let Some(previous) = previous {
            debug!(participant = %participant_id, "Replacing previous connection");
            if previous.room_id != room_id {
                state.leave_channel(&previous.room_id, participant_id);
            }
        }
        state
            .channels
            .entry(room_id.to_string())
            .or_default()
            .insert(participant_id.to_string());

        info!(room_id = %room_id, participant = %participant_id, connection_id = %id, "Connection registered");
        id
    }

    async fn remove_connection(&self, participant_id: &str, connection_id: Uuid) {
        let mut state = self.state.write().await;

        let room_id = match state.connections.get(participant_id) {
            Some(current) if current.id == connection_id => current.room_id.clone(),
            _ => {
                debug!(participant = %participant_id, "Stale connection cleanup ignored");
                return;
            }
        };
        state.connections.remove(participant_id);
        state.leave_channel(&room_id, participant_id);
        info!(room_id = %room_id, participant = %participant_id, "Connection removed");
    }
}

#[async_trait]
impl ChannelTransport for InMemoryConnectionManager {
    async fn send_to_channel(&self, channel_id: &str, payload: &str) -> Result<(), TransportError> {
        let state = self.state.read().await;
        let Some(members) = state.channels.get(channel_id) else {
            debug!(channel = %channel_id, "No members on channel");
            return Ok(());
        };

        for participant_id in members {
            if let Some(connection) = state.connections.get(participant_id) {
                // One closed socket must not stop the broadcast
                if connection.sender.send(payload.to_string()).is_err() {
                    debug!(channel = %channel_id, participant = %participant_id, "Member gone");
                }
            }
        }
        Ok(())
    }

    async fn send_to_participant(
        &self,
        participant_id: &str,
        payload: &str,
    ) -> Result<(), TransportError> {
        let state = self.state.read().await;
        let connection = state
            .connections
            .get(participant_id)
            .ok_or_else(|| TransportError::NotConnected(participant_id.to_string()))?;

        connection
            .sender
            .send(payload.to_string())
            .map_err(|_| TransportError::Disconnected(participant_id.to_string()))
    }
}
