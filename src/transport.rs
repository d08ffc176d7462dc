use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("Participant not connected: {0}")]
    NotConnected(String),

    #[error("Connection closed while sending to {0}")]
    Disconnected(String),

    #[error("Failed to encode message: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Encode(e.to_string())
    }
}

/// Delivery of serialized messages to a room channel or a single participant
///
/// Each call reports its own success; callers decide whether a failure
/// matters for the operation they are performing.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Broadcast to every participant subscribed to the channel
    async fn send_to_channel(&self, channel_id: &str, payload: &str) -> Result<(), TransportError>;

    /// Deliver to one participant
    async fn send_to_participant(
        &self,
        participant_id: &str,
        payload: &str,
    ) -> Result<(), TransportError>;
}
