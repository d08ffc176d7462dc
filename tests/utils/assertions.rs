//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use livequiz::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

enum Target<'a> {
    Channel(&'a str),
    Participant(&'a str),
}

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    target: Target<'a>,
}

impl<'a> MessageAssertion<'a> {
    /// Assert on what was broadcast to the room channel
    pub fn for_channel(setup: &'a TestSetup) -> Self {
        Self {
            setup,
            target: Target::Channel(&setup.room_id),
        }
    }

    /// Assert on what was sent directly to one participant
    pub fn for_participant(setup: &'a TestSetup, participant: &'a str) -> Self {
        Self {
            setup,
            target: Target::Participant(participant),
        }
    }

    async fn next(&self) -> Option<String> {
        match self.target {
            Target::Channel(channel) => {
                self.setup
                    .mock_conn_manager
                    .consume_channel_message(channel)
                    .await
            }
            Target::Participant(participant) => {
                self.setup
                    .mock_conn_manager
                    .consume_message_for(participant)
                    .await
            }
        }
    }

    /// Consumes the next message and checks its type
    pub async fn received_message_type(&self, expected_type: MessageType) -> MessageContent {
        let raw = self.next().await;
        assert!(raw.is_some(), "expected a {:?} message", expected_type);

        let msg: WebSocketMessage = serde_json::from_str(&raw.unwrap()).unwrap();
        assert_eq!(msg.message_type, expected_type, "received wrong message type");
        MessageContent { data: msg.data }
    }

    pub async fn received_no_messages(&self) {
        let raw = self.next().await;
        assert!(raw.is_none(), "unexpected message: {:?}", raw);
    }
}

pub struct MessageContent {
    pub data: Value,
}

impl MessageContent {
    pub fn verify_result(self, sequence: usize, correct: usize, total: usize) -> Self {
        assert_eq!(self.data["sequence"], sequence);
        assert_eq!(self.data["correctCount"], correct);
        assert_eq!(self.data["totalAnswered"], total);
        self
    }

    pub fn verify_histogram_total(self, total: u64) -> Self {
        let sum: u64 = self.data["histogram"]
            .as_object()
            .expect("histogram should be an object")
            .values()
            .map(|v| v.as_u64().unwrap())
            .sum();
        assert_eq!(sum, total, "histogram does not add up to answers");
        self
    }

    pub fn verify_winners(self, expected: &[&str]) -> Self {
        assert_eq!(self.data["count"], expected.len());
        assert_eq!(self.data["participantIds"], serde_json::json!(expected));
        self
    }
}
