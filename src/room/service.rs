use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{
    errors::RoomError,
    models::{CanPlay, Room, RoundSummary},
    repository::{RoomRepository, SharedRoom},
};
use crate::{
    cipher::{EncryptionCodec, PAYLOAD_VERSION},
    quiz::{Quiz, QuizCatalog, QuizPayload},
    transport::{ChannelTransport, TransportError},
    websockets::WebSocketMessage,
};

/// Room operations that touch collaborators: quiz loading, encryption and delivery
pub struct RoomService {
    repository: Arc<dyn RoomRepository>,
    catalog: Arc<dyn QuizCatalog>,
    transport: Arc<dyn ChannelTransport>,
    codec: Arc<dyn EncryptionCodec>,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        catalog: Arc<dyn QuizCatalog>,
        transport: Arc<dyn ChannelTransport>,
        codec: Arc<dyn EncryptionCodec>,
    ) -> Self {
        Self {
            repository,
            catalog,
            transport,
            codec,
        }
    }

    async fn room(&self, room_id: &str) -> Result<SharedRoom, RoomError> {
        self.repository
            .get(room_id)
            .await
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
    }

    /// Loads the named quiz set and creates the room, or reuses it with the new set
    #[instrument(skip(self))]
    pub async fn create_or_reuse(
        &self,
        room_id: &str,
        quiz_set_name: &str,
        encryption_mode: Option<&str>,
    ) -> Result<String, RoomError> {
        let quizzes = self.catalog.load(quiz_set_name).await.map_err(|e| {
            warn!(quiz_set = %quiz_set_name, error = %e, "Quiz set could not be loaded");
            RoomError::QuizLoadFailed(e.to_string())
        })?;

        let mode = match encryption_mode {
            Some(mode) if self.codec.supports(mode) => Some(mode.to_string()),
            Some(mode) => {
                info!(room_id = %room_id, mode = %mode, "Unsupported encryption, falling back to plain");
                None
            }
            None => None,
        };

        let (_, lookup) = self
            .repository
            .get_or_create(room_id, quiz_set_name, quizzes, mode)
            .await;
        debug!(room_id = %room_id, ?lookup, "Room ready");

        Ok(room_id.to_string())
    }

    /// Replaces a room's quiz set with a client-supplied one and resets it
    #[instrument(skip(self, quizzes))]
    pub async fn set_quiz_set(
        &self,
        room_id: &str,
        quizzes: Vec<Quiz>,
        timeout: Option<u32>,
    ) -> Result<(), RoomError> {
        let quizzes: Vec<Quiz> = match timeout {
            Some(seconds) => quizzes.into_iter().map(|q| q.with_timeout(seconds)).collect(),
            None => quizzes,
        };

        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        info!(room_id = %room_id, quiz_count = quizzes.len(), "Replacing quiz set");
        room.replace_quiz_set(quizzes);
        room.reset();
        Ok(())
    }

    /// Opens the next quiz and broadcasts it. Returns the plain payload.
    #[instrument(skip(self))]
    pub async fn publish(&self, room_id: &str) -> Result<QuizPayload, RoomError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;

        let payload = room.open_next()?;
        let message = self.quiz_message(&room, &payload)?.to_json()?;

        if let Err(e) = self.transport.send_to_participant(room_id, &message).await {
            debug!(room_id = %room_id, error = %e, "Raw channel broadcast not delivered");
        }
        self.transport
            .send_to_channel(room_id, &message)
            .await
            .map_err(|e| {
                error!(room_id = %room_id, error = %e, "Quiz broadcast failed");
                RoomError::from(e)
            })?;

        Ok(payload)
    }

    fn quiz_message(
        &self,
        room: &Room,
        payload: &QuizPayload,
    ) -> Result<WebSocketMessage, RoomError> {
        let Some(mode) = room.encryption_mode().filter(|m| self.codec.supports(m)) else {
            return Ok(WebSocketMessage::quiz(payload));
        };

        let plaintext = serde_json::to_string(payload).map_err(TransportError::from)?;
        let envelope = self
            .codec
            .encrypt(PAYLOAD_VERSION, &plaintext, room.id())
            .map_err(|e| {
                error!(room_id = %room.id(), mode = %mode, error = %e, "Quiz encryption failed");
                RoomError::TransportFailed(e.to_string())
            })?;
        Ok(WebSocketMessage::encrypted_quiz(envelope))
    }

    /// Closes the open quiz, then broadcasts the round result. The round has
    /// advanced even when the broadcast fails.
    ///
    /// The room stays locked until the summary is sent, so the next quiz can
    /// never reach clients before this round's result.
    #[instrument(skip(self))]
    pub async fn close_quiz(&self, room_id: &str) -> Result<(), RoomError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        let summary = room.close()?;

        self.broadcast_summary(room_id, &summary).await
    }

    async fn broadcast_summary(
        &self,
        room_id: &str,
        summary: &RoundSummary,
    ) -> Result<(), RoomError> {
        info!(
            room_id = %room_id,
            sequence = summary.sequence,
            right = summary.correct_count,
            wrong = summary.wrong_participants.len(),
            histogram = ?summary.histogram,
            "Round summary"
        );

        let result = WebSocketMessage::result(summary).to_json()?;
        self.transport
            .send_to_channel(room_id, &result)
            .await
            .map_err(|e| {
                error!(room_id = %room_id, error = %e, "Result broadcast failed");
                RoomError::from(e)
            })?;

        if summary.is_final {
            info!(room_id = %room_id, winners = summary.correct_count, "Final round closed");
            let winners = WebSocketMessage::winners(summary.correct_participants.clone()).to_json()?;
            self.transport.send_to_channel(room_id, &winners).await?;
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn reset(&self, room_id: &str) -> Result<(), RoomError> {
        let room = self.room(room_id).await?;
        room.lock().await.reset();
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn commit_answer(
        &self,
        room_id: &str,
        participant_id: &str,
        sequence_id: usize,
        option_index: usize,
    ) -> Result<(), RoomError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        room.submit_answer(participant_id, sequence_id, option_index)
    }

    pub async fn can_play(&self, room_id: &str, participant_id: &str) -> Result<CanPlay, RoomError> {
        let room = self.room(room_id).await?;
        let room = room.lock().await;
        Ok(room.can_play(participant_id))
    }

    #[instrument(skip(self))]
    pub async fn relive(&self, room_id: &str, participant_id: &str) -> Result<(), RoomError> {
        let room = self.room(room_id).await?;
        room.lock().await.relive(participant_id);
        Ok(())
    }

    /// Ends any pending invite, then invites `invitee`. The slot is only
    /// taken once the request has been delivered.
    #[instrument(skip(self))]
    pub async fn invite_request(&self, room_id: &str, invitee_id: &str) -> Result<(), RoomError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;

        self.end_pending_invite(&mut room).await?;

        let message = WebSocketMessage::invite_request(invitee_id).to_json()?;
        self.transport
            .send_to_participant(invitee_id, &message)
            .await?;
        room.set_pending_invite(Some(invitee_id.to_string()));

        info!(room_id = %room_id, invitee = %invitee_id, "Invite sent");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn invite_end(&self, room_id: &str) -> Result<(), RoomError> {
        let room = self.room(room_id).await?;
        let mut room = room.lock().await;
        self.end_pending_invite(&mut room).await
    }

    async fn end_pending_invite(&self, room: &mut Room) -> Result<(), RoomError> {
        let Some(previous) = room.pending_invite().map(str::to_string) else {
            return Ok(());
        };

        let message = WebSocketMessage::invite_end(&previous).to_json()?;
        match self.transport.send_to_participant(&previous, &message).await {
            Ok(()) => {}
            // Nobody left to notify
            Err(TransportError::NotConnected(_)) => {
                debug!(room_id = %room.id(), invitee = %previous, "Previous invitee already gone");
            }
            Err(e) => return Err(e.into()),
        }

        room.set_pending_invite(None);
        info!(room_id = %room.id(), invitee = %previous, "Invite ended");
        Ok(())
    }

    /// Relays the invitee's answer to the room. Responses from anyone but the
    /// pending invitee are dropped.
    #[instrument(skip(self))]
    pub async fn invite_response(
        &self,
        room_id: &str,
        invitee_id: &str,
        accept: bool,
        media_uid: &str,
    ) -> Result<(), RoomError> {
        let room = self.room(room_id).await?;
        let room = room.lock().await;

        if room.pending_invite() != Some(invitee_id) {
            warn!(
                room_id = %room_id,
                invitee = %invitee_id,
                pending = ?room.pending_invite(),
                "Invite response does not match pending invite"
            );
            return Ok(());
        }

        let message = WebSocketMessage::invite_response(invitee_id, accept, media_uid).to_json()?;
        self.transport.send_to_channel(room_id, &message).await?;
        Ok(())
    }
}
