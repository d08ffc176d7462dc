#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;

use livequiz::{
    cipher::{EncryptionCodec, NoopCodec},
    dispatch::{DedupConfig, MessageDispatcher},
    quiz::{InMemoryQuizCatalog, Quiz},
    room::{repository::InMemoryRoomRepository, RoomService},
    AppState,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const QUIZ_SET: &str = "quiz-1";

pub struct TestSetup {
    pub room_id: String,
    pub dispatcher: Arc<MessageDispatcher>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub app_state: AppState,
}

pub struct TestSetupBuilder {
    room_id: String,
    quizzes: Vec<Quiz>,
    codec: Arc<dyn EncryptionCodec>,
    connected: Vec<String>,
    dedup: DedupConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            room_id: "room-123".to_string(),
            quizzes: two_round_quiz_set(),
            codec: Arc::new(NoopCodec),
            connected: vec![],
            dedup: DedupConfig::default(),
        }
    }

    pub fn with_quizzes(mut self, quizzes: Vec<Quiz>) -> Self {
        self.quizzes = quizzes;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn EncryptionCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Participants reachable by direct sends (invites)
    pub fn with_connected(mut self, participants: Vec<&str>) -> Self {
        self.connected = participants.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_dedup(mut self, dedup: DedupConfig) -> Self {
        self.dedup = dedup;
        self
    }

    pub async fn build(self) -> TestSetup {
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        for participant in &self.connected {
            mock_conn_manager.add_connected_participant(participant).await;
        }

        let catalog = InMemoryQuizCatalog::new().with_set(QUIZ_SET, self.quizzes);
        let service = RoomService::new(
            Arc::new(InMemoryRoomRepository::default()),
            Arc::new(catalog),
            mock_conn_manager.clone(),
            self.codec,
        );
        let dispatcher = Arc::new(MessageDispatcher::new(Arc::new(service), self.dedup));
        let app_state = AppState::new(dispatcher.clone(), mock_conn_manager.clone());

        TestSetup {
            room_id: self.room_id,
            dispatcher,
            mock_conn_manager,
            app_state,
        }
    }
}

/// The two-round set used throughout the workflow tests
pub fn two_round_quiz_set() -> Vec<Quiz> {
    vec![
        Quiz::new("q0", "First?", &["A", "B"], 0),
        Quiz::new("q1", "Second?", &["A", "B", "C"], 2),
    ]
}
