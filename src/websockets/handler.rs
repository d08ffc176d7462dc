use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dispatch::MessageDispatcher;
use crate::quiz::quiz_set_for_language;
use crate::shared::{AppError, AppState};
use crate::websockets::messages::WebSocketMessage;

use super::socket::{Connection, MessageHandler};

/// Channel name recorded for messages arriving over the realtime connection
pub const REALTIME_CHANNEL: &str = "sig";

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    pub uid: Option<String>,
}

/// Inbound frame as clients send it
#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    hqmsgid: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default, rename = "QuestionLanguage")]
    question_language: Option<String>,
    #[serde(default)]
    encrypt: Option<String>,
}

impl InboundMessage {
    fn data_field(&self, name: &str) -> Value {
        self.data.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Maps the frame onto an action name and its params, `None` for unknown types
    fn to_action(&self, participant_id: &str, room_id: &str) -> Option<(&'static str, Value)> {
        let action = match self.message_type.as_str() {
            "publish" => ("publish", json!({ "roomId": room_id })),
            "stopAnswer" => ("closeQuiz", json!({ "roomId": room_id })),
            "reset" => ("reset", json!({ "roomId": room_id })),
            "RequestChannelName" => (
                "createOrReuseRoom",
                json!({
                    "roomId": room_id,
                    "quizSetName": quiz_set_for_language(self.question_language.as_deref()),
                    "encryptionMode": self.encrypt,
                }),
            ),
            "inviteRequest" => (
                "inviteRequest",
                json!({ "roomId": room_id, "inviteeId": self.data_field("uid") }),
            ),
            "inviteEnd" => ("inviteEnd", json!({ "roomId": room_id })),
            "inviteResponse" => (
                "inviteResponse",
                json!({
                    "roomId": room_id,
                    "inviteeId": participant_id,
                    "accept": self.data_field("accept"),
                    "mediaUid": self.data_field("mediaUid"),
                }),
            ),
            "answer" => (
                "commitAnswer",
                json!({
                    "roomId": room_id,
                    "participantId": participant_id,
                    "sequenceId": self.data_field("sid"),
                    "optionIndex": self.data_field("result"),
                }),
            ),
            "relive" => (
                "relive",
                json!({ "roomId": room_id, "participantId": self.data_field("uid") }),
            ),
            _ => return None,
        };
        Some(action)
    }
}

/// Turns realtime frames into dispatched actions and answers each with an info reply
pub struct RealtimeMessageHandler {
    dispatcher: Arc<MessageDispatcher>,
}

impl RealtimeMessageHandler {
    pub fn new(dispatcher: Arc<MessageDispatcher>) -> Self {
        Self { dispatcher }
    }

    fn reply(message: WebSocketMessage) -> Option<String> {
        match message.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                error!(error = %e, "Failed to encode reply");
                None
            }
        }
    }
}

#[async_trait]
impl MessageHandler for RealtimeMessageHandler {
    async fn handle_message(
        &self,
        participant_id: &str,
        room_id: &str,
        message: String,
    ) -> Option<String> {
        info!(
            participant = %participant_id,
            room_id = %room_id,
            message = %message,
            "Received message"
        );

        let inbound = match serde_json::from_str::<InboundMessage>(&message) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(participant = %participant_id, error = %e, "Failed to parse WebSocket message");
                return Self::reply(WebSocketMessage::info(
                    None,
                    Some("malformed message".to_string()),
                    Value::Null,
                ));
            }
        };

        let Some(message_id) = inbound.hqmsgid.clone().filter(|m| !m.is_empty()) else {
            return Self::reply(WebSocketMessage::info(
                None,
                Some("no msgid presents, refuse to process".to_string()),
                Value::Null,
            ));
        };

        let Some((action, params)) = inbound.to_action(participant_id, room_id) else {
            debug!(message_type = %inbound.message_type, "Unhandled message type");
            return Self::reply(WebSocketMessage::info(
                Some(message_id),
                Some(format!("unrecognized action {}", inbound.message_type)),
                Value::Null,
            ));
        };

        let result = self
            .dispatcher
            .process(
                Some(REALTIME_CHANNEL),
                Some(message_id.as_str()),
                Some(action),
                Some(params),
            )
            .await;

        let reply = match result {
            Ok(outcome) => WebSocketMessage::info(Some(message_id), None, outcome.data()),
            Err(e) => {
                error!(message_id = %message_id, code = e.code(), error = %e, "Realtime action failed");
                WebSocketMessage::info(Some(message_id), Some(e.code().to_string()), Value::Null)
            }
        };
        Self::reply(reply)
    }
}

/// WebSocket endpoint: GET /ws/{room_id}?uid={participant_id}
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<WebSocketQuery>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let participant_id = query
        .uid
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(|| {
            warn!(room_id = %room_id, "WebSocket request without uid");
            AppError::InfoMissing("uid is required".to_string())
        })?;

    info!(
        room_id = %room_id,
        participant = %participant_id,
        "WebSocket connection requested"
    );
    Ok(ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, room_id, participant_id, app_state)
    }))
}

async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    room_id: String,
    participant_id: String,
    app_state: AppState,
) {
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    let connection_id = app_state
        .connection_manager
        .add_connection(&room_id, &participant_id, outbound_sender)
        .await;

    let message_handler = Arc::new(RealtimeMessageHandler::new(app_state.dispatcher.clone()));
    let connection = Connection::new(
        participant_id.clone(),
        room_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => info!(
            room_id = %room_id,
            participant = %participant_id,
            "WebSocket connection closed cleanly"
        ),
        Err(e) => warn!(
            room_id = %room_id,
            participant = %participant_id,
            error = ?e,
            "WebSocket connection error"
        ),
    }

    app_state
        .connection_manager
        .remove_connection(&participant_id, connection_id)
        .await;
}
