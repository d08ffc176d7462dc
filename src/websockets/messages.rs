use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::quiz::QuizPayload;
use crate::room::models::RoundSummary;
use crate::transport::TransportError;

/// Message types for outbound realtime communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    // Round lifecycle
    Quiz,
    Result,
    Winners,

    // Co-presenter invites
    InviteRequest,
    InviteEnd,
    InviteResponse,

    // Replies
    Channel,
    Info,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Envelope for every message the server sends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hqmsgid: Option<String>,
    pub meta: Option<WebSocketMessageMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnersPayload {
    pub count: usize,
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitePayload {
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponsePayload {
    pub accept: bool,
    pub media_uid: String,
    pub uid: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, data: serde_json::Value) -> Self {
        Self {
            message_type,
            data,
            err: None,
            hqmsgid: None,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    /// Create a QUIZ message from a plain payload
    pub fn quiz(payload: &QuizPayload) -> Self {
        Self::new(MessageType::Quiz, json!(payload))
    }

    /// Create a QUIZ message carrying an encrypted envelope
    pub fn encrypted_quiz(envelope: serde_json::Value) -> Self {
        Self::new(MessageType::Quiz, envelope)
    }

    /// Create a RESULT message for a closed round
    pub fn result(summary: &RoundSummary) -> Self {
        Self::new(MessageType::Result, json!(summary))
    }

    /// Create a WINNERS message after the final round
    pub fn winners(participant_ids: Vec<String>) -> Self {
        let payload = WinnersPayload {
            count: participant_ids.len(),
            participant_ids,
        };
        Self::new(MessageType::Winners, json!(payload))
    }

    pub fn invite_request(uid: &str) -> Self {
        let payload = InvitePayload {
            uid: uid.to_string(),
        };
        Self::new(MessageType::InviteRequest, json!(payload))
    }

    pub fn invite_end(uid: &str) -> Self {
        let payload = InvitePayload {
            uid: uid.to_string(),
        };
        Self::new(MessageType::InviteEnd, json!(payload))
    }

    pub fn invite_response(uid: &str, accept: bool, media_uid: &str) -> Self {
        let payload = InviteResponsePayload {
            accept,
            media_uid: media_uid.to_string(),
            uid: uid.to_string(),
        };
        Self::new(MessageType::InviteResponse, json!(payload))
    }

    /// Create a CHANNEL message telling a client which room it is bound to
    pub fn channel(room_id: &str) -> Self {
        Self::new(MessageType::Channel, json!(room_id))
    }

    /// Create an INFO reply for a processed (or refused) request
    pub fn info(hqmsgid: Option<String>, err: Option<String>, data: serde_json::Value) -> Self {
        let mut message = Self::new(MessageType::Info, data);
        message.hqmsgid = hqmsgid;
        message.err = err;
        message
    }

    pub fn to_json(&self) -> Result<String, TransportError> {
        Ok(serde_json::to_string(self)?)
    }
}
