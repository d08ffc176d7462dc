//! Helpers that drive a room through the dispatcher the way clients do
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::{json, Value};
use uuid::Uuid;

use livequiz::dispatch::{ActionOutcome, DispatchError};

use super::setup::{TestSetup, QUIZ_SET};

pub type Outcome = Result<ActionOutcome, DispatchError>;

impl TestSetup {
    /// Sends an action with a fresh message id
    pub async fn send(&self, action: &str, params: Value) -> Outcome {
        let message_id = Uuid::new_v4().to_string();
        self.send_with_id(&message_id, action, params).await
    }

    pub async fn send_with_id(&self, message_id: &str, action: &str, params: Value) -> Outcome {
        self.dispatcher
            .process(Some("sig"), Some(message_id), Some(action), Some(params))
            .await
    }

    pub async fn create_room(&self) -> Outcome {
        self.send(
            "createOrReuseRoom",
            json!({ "roomId": self.room_id, "quizSetName": QUIZ_SET }),
        )
        .await
    }

    pub async fn create_encrypted_room(&self, mode: &str) -> Outcome {
        self.send(
            "createOrReuseRoom",
            json!({ "roomId": self.room_id, "quizSetName": QUIZ_SET, "encryptionMode": mode }),
        )
        .await
    }

    pub async fn publish(&self) -> Outcome {
        self.send("publish", json!({ "roomId": self.room_id })).await
    }

    pub async fn close_quiz(&self) -> Outcome {
        self.send("closeQuiz", json!({ "roomId": self.room_id })).await
    }

    pub async fn reset(&self) -> Outcome {
        self.send("reset", json!({ "roomId": self.room_id })).await
    }

    pub async fn answer(&self, participant: &str, sequence: usize, option: usize) -> Outcome {
        self.send(
            "commitAnswer",
            json!({
                "roomId": self.room_id,
                "participantId": participant,
                "sequenceId": sequence,
                "optionIndex": option,
            }),
        )
        .await
    }

    pub async fn can_play(&self, participant: &str) -> Value {
        self.send(
            "canPlay",
            json!({ "roomId": self.room_id, "participantId": participant }),
        )
        .await
        .expect("canPlay should succeed")
        .data()
    }

    pub async fn relive(&self, participant: &str) -> Outcome {
        self.send(
            "relive",
            json!({ "roomId": self.room_id, "participantId": participant }),
        )
        .await
    }

    pub async fn invite(&self, invitee: &str) -> Outcome {
        self.send(
            "inviteRequest",
            json!({ "roomId": self.room_id, "inviteeId": invitee }),
        )
        .await
    }

    pub async fn end_invite(&self) -> Outcome {
        self.send("inviteEnd", json!({ "roomId": self.room_id })).await
    }

    pub async fn respond_to_invite(&self, invitee: &str, accept: bool, media_uid: &str) -> Outcome {
        self.send(
            "inviteResponse",
            json!({
                "roomId": self.room_id,
                "inviteeId": invitee,
                "accept": accept,
                "mediaUid": media_uid,
            }),
        )
        .await
    }
}
