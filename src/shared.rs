use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::dispatch::{DispatchError, MessageDispatcher};
use crate::room::RoomError;
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MessageDispatcher>,
    pub connection_manager: Arc<dyn ConnectionManager>,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<MessageDispatcher>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            dispatcher,
            connection_manager,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing information: {0}")]
    InfoMissing(String),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::InfoMissing(msg) => AppError::InfoMissing(msg),
            DispatchError::Room(e) => AppError::Room(e),
            e @ DispatchError::Interrupted(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InfoMissing(_) => "info_missing",
            AppError::Room(e) => e.code(),
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InfoMissing(_) => StatusCode::BAD_REQUEST,
            AppError::Room(e) => match e {
                RoomError::RoomNotFound(_) => StatusCode::NOT_FOUND,
                RoomError::CannotPlay(_) => StatusCode::FORBIDDEN,
                RoomError::InvalidOption { .. } | RoomError::QuizLoadFailed(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                RoomError::TransportFailed(_) => StatusCode::BAD_GATEWAY,
                RoomError::QuizInProgress
                | RoomError::NoMoreQuiz
                | RoomError::AlreadyClosed
                | RoomError::SequenceMismatch { .. }
                | RoomError::RoomClosed
                | RoomError::AlreadyAnswered => StatusCode::CONFLICT,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

/// JSON body extractor whose rejections use the same error body as every
/// other failure, so a missing or malformed body reads as `info_missing`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::InfoMissing(rejection.body_text())),
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::cipher::{EncryptionCodec, NoopCodec};
    use crate::dispatch::DedupConfig;
    use crate::quiz::{InMemoryQuizCatalog, Quiz};
    use crate::room::repository::InMemoryRoomRepository;
    use crate::room::RoomService;
    use crate::transport::{ChannelTransport, TransportError};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    /// Transport that records every payload instead of delivering it
    #[derive(Default)]
    pub struct RecordingTransport {
        connected: Mutex<HashSet<String>>,
        channel_sent: Mutex<HashMap<String, Vec<String>>>,
        participant_sent: Mutex<HashMap<String, Vec<String>>>,
        fail_channel: Mutex<bool>,
        delays: Mutex<Vec<(String, Duration)>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Participant sends only succeed for connected ids
        pub fn connect(&self, participant_id: &str) {
            self.connected
                .lock()
                .unwrap()
                .insert(participant_id.to_string());
        }

        pub fn fail_channel_sends(&self, fail: bool) {
            *self.fail_channel.lock().unwrap() = fail;
        }

        /// Holds every send whose payload contains `needle` for `delay` before recording it
        pub fn delay_sends_containing(&self, needle: &str, delay: Duration) {
            self.delays
                .lock()
                .unwrap()
                .push((needle.to_string(), delay));
        }

        async fn pause_for(&self, payload: &str) {
            let delay = self
                .delays
                .lock()
                .unwrap()
                .iter()
                .find(|(needle, _)| payload.contains(needle.as_str()))
                .map(|(_, delay)| *delay);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }

        pub fn channel_messages(&self, channel_id: &str) -> Vec<Value> {
            Self::decoded(&self.channel_sent, channel_id)
        }

        pub fn participant_messages(&self, participant_id: &str) -> Vec<Value> {
            Self::decoded(&self.participant_sent, participant_id)
        }

        fn decoded(sent: &Mutex<HashMap<String, Vec<String>>>, key: &str) -> Vec<Value> {
            sent.lock()
                .unwrap()
                .get(key)
                .map(|messages| {
                    messages
                        .iter()
                        .map(|m| serde_json::from_str(m).unwrap())
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChannelTransport for RecordingTransport {
        async fn send_to_channel(
            &self,
            channel_id: &str,
            payload: &str,
        ) -> Result<(), TransportError> {
            if *self.fail_channel.lock().unwrap() {
                return Err(TransportError::Disconnected(channel_id.to_string()));
            }
            self.pause_for(payload).await;
            self.channel_sent
                .lock()
                .unwrap()
                .entry(channel_id.to_string())
                .or_default()
                .push(payload.to_string());
            Ok(())
        }

        async fn send_to_participant(
            &self,
            participant_id: &str,
            payload: &str,
        ) -> Result<(), TransportError> {
            if !self.connected.lock().unwrap().contains(participant_id) {
                return Err(TransportError::NotConnected(participant_id.to_string()));
            }
            self.pause_for(payload).await;
            self.participant_sent
                .lock()
                .unwrap()
                .entry(participant_id.to_string())
                .or_default()
                .push(payload.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl ConnectionManager for RecordingTransport {
        async fn add_connection(
            &self,
            _room_id: &str,
            participant_id: &str,
            _sender: mpsc::UnboundedSender<String>,
        ) -> Uuid {
            self.connect(participant_id);
            Uuid::new_v4()
        }

        async fn remove_connection(&self, participant_id: &str, _connection_id: Uuid) {
            self.connected.lock().unwrap().remove(participant_id);
        }
    }

    pub fn sample_catalog() -> InMemoryQuizCatalog {
        InMemoryQuizCatalog::new()
            .with_set(
                "quiz-1",
                vec![
                    Quiz::new("q0", "First?", &["A", "B"], 0),
                    Quiz::new("q1", "Second?", &["A", "B", "C"], 2),
                ],
            )
            .with_set("quiz-2", vec![Quiz::new("p0", "Premier?", &["A", "B"], 1)])
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        transport: Option<Arc<RecordingTransport>>,
        codec: Option<Arc<dyn EncryptionCodec>>,
        dedup: DedupConfig,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                transport: None,
                codec: None,
                dedup: DedupConfig::default(),
            }
        }

        pub fn with_transport(mut self, transport: Arc<RecordingTransport>) -> Self {
            self.transport = Some(transport);
            self
        }

        pub fn with_codec(mut self, codec: Arc<dyn EncryptionCodec>) -> Self {
            self.codec = Some(codec);
            self
        }

        pub fn build(self) -> AppState {
            let transport = self
                .transport
                .unwrap_or_else(|| Arc::new(RecordingTransport::new()));
            let service = RoomService::new(
                Arc::new(InMemoryRoomRepository::default()),
                Arc::new(sample_catalog()),
                transport.clone(),
                self.codec.unwrap_or_else(|| Arc::new(NoopCodec)),
            );
            AppState {
                dispatcher: Arc::new(MessageDispatcher::new(Arc::new(service), self.dedup)),
                connection_manager: transport,
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
