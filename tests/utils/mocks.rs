#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use livequiz::{
    transport::{ChannelTransport, TransportError},
    websockets::ConnectionManager,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records outbound messages per channel and per participant
#[derive(Clone, Default)]
pub struct MockConnectionManager {
    channel_messages: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
    participant_messages: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
    connected: Arc<RwLock<HashSet<String>>>,
    failing_channel: Arc<RwLock<bool>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_connected_participant(&self, participant_id: &str) {
        self.connected
            .write()
            .await
            .insert(participant_id.to_string());
    }

    pub async fn fail_channel_sends(&self, fail: bool) {
        *self.failing_channel.write().await = fail;
    }

    /// Pops the oldest unread message sent to a channel
    pub async fn consume_channel_message(&self, channel_id: &str) -> Option<String> {
        self.channel_messages
            .write()
            .await
            .get_mut(channel_id)
            .and_then(|queue| queue.pop_front())
    }

    pub async fn consume_message_for(&self, participant_id: &str) -> Option<String> {
        self.participant_messages
            .write()
            .await
            .get_mut(participant_id)
            .and_then(|queue| queue.pop_front())
    }

    pub async fn pending_channel_messages(&self, channel_id: &str) -> usize {
        self.channel_messages
            .read()
            .await
            .get(channel_id)
            .map_or(0, |queue| queue.len())
    }
}

#[async_trait]
impl ChannelTransport for MockConnectionManager {
    async fn send_to_channel(&self, channel_id: &str, payload: &str) -> Result<(), TransportError> {
        if *self.failing_channel.read().await {
            return Err(TransportError::Disconnected(channel_id.to_string()));
        }
        self.channel_messages
            .write()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .push_back(payload.to_string());
        Ok(())
    }

    async fn send_to_participant(
        &self,
        participant_id: &str,
        payload: &str,
    ) -> Result<(), TransportError> {
        if !self.connected.read().await.contains(participant_id) {
            return Err(TransportError::NotConnected(participant_id.to_string()));
        }
        self.participant_messages
            .write()
            .await
            .entry(participant_id.to_string())
            .or_default()
            .push_back(payload.to_string());
        Ok(())
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(
        &self,
        _room_id: &str,
        participant_id: &str,
        _sender: mpsc::UnboundedSender<String>,
    ) -> Uuid {
        self.add_connected_participant(participant_id).await;
        Uuid::new_v4()
    }

    async fn remove_connection(&self, participant_id: &str, _connection_id: Uuid) {
        self.connected.write().await.remove(participant_id);
    }
}
