use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{
    actions::{Action, ActionOutcome},
    dedup::{DedupCache, DedupConfig, DedupStatus, DispatchResult},
    errors::DispatchError,
};
use crate::room::RoomService;

/// Routes actions to the room service, running each message id at most once
pub struct MessageDispatcher {
    service: Arc<RoomService>,
    dedup: Arc<DedupCache>,
}

impl MessageDispatcher {
    pub fn new(service: Arc<RoomService>, config: DedupConfig) -> Self {
        Self {
            service,
            dedup: Arc::new(DedupCache::new(config)),
        }
    }

    pub fn service(&self) -> &Arc<RoomService> {
        &self.service
    }

    /// Handles a message that may be delivered more than once. A repeated
    /// message id gets the first delivery's result without running again.
    #[instrument(skip(self, params))]
    pub async fn process(
        &self,
        channel: Option<&str>,
        message_id: Option<&str>,
        action: Option<&str>,
        params: Option<Value>,
    ) -> DispatchResult {
        let present = |field: &str, value: Option<&str>| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| DispatchError::InfoMissing(format!("{} is required", field)))
        };
        let _channel = present("channel", channel)?;
        let message_id = present("messageId", message_id)?;
        let action_name = present("action", action)?;
        let params = params.ok_or_else(|| DispatchError::InfoMissing("params is required".into()))?;

        let action = Action::parse(&action_name, params)?;

        match self.dedup.check_and_record(&message_id) {
            DedupStatus::New => {}
            DedupStatus::InFlight => {
                debug!(message_id = %message_id, "Message still being processed");
                return Ok(ActionOutcome::Acknowledged);
            }
            DedupStatus::Completed(result) => {
                debug!(message_id = %message_id, "Replaying result of earlier delivery");
                return result;
            }
        }

        // The first delivery runs to completion on its own task, even if this
        // caller goes away, so its result is always recorded for redeliveries.
        let service = self.service.clone();
        let dedup = self.dedup.clone();
        let task_message_id = message_id.clone();
        let task = tokio::spawn(async move {
            let result = Self::run_logged(&service, action).await;
            dedup.complete(&task_message_id, &result);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                self.dedup.forget(&message_id);
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
                error!(message_id = %message_id, error = %e, "Action task did not finish");
                Err(DispatchError::Interrupted(message_id))
            }
        }
    }

    /// Runs an action with no duplicate detection
    pub async fn execute(&self, action: Action) -> DispatchResult {
        Self::run_logged(&self.service, action).await
    }

    async fn run_logged(service: &RoomService, action: Action) -> DispatchResult {
        let name = action.name();
        let room_id = action.room_id().to_string();
        debug!(action = name, room_id = %room_id, "Executing action");

        let result = Self::run(service, action).await;
        match &result {
            Ok(_) => info!(action = name, room_id = %room_id, "Action succeeded"),
            Err(e) => warn!(action = name, room_id = %room_id, code = e.code(), error = %e, "Action failed"),
        }
        result
    }

    async fn run(service: &RoomService, action: Action) -> DispatchResult {
        let outcome = match action {
            Action::CreateOrReuseRoom {
                room_id,
                quiz_set_name,
                encryption_mode,
            } => ActionOutcome::RoomReady(
                service
                    .create_or_reuse(&room_id, &quiz_set_name, encryption_mode.as_deref())
                    .await?,
            ),
            Action::Publish { room_id } => ActionOutcome::Published(service.publish(&room_id).await?),
            Action::CloseQuiz { room_id } => {
                service.close_quiz(&room_id).await?;
                ActionOutcome::Done
            }
            Action::Reset { room_id } => {
                service.reset(&room_id).await?;
                ActionOutcome::Done
            }
            Action::CommitAnswer {
                room_id,
                participant_id,
                sequence_id,
                option_index,
            } => {
                service
                    .commit_answer(&room_id, &participant_id, sequence_id, option_index)
                    .await?;
                ActionOutcome::Done
            }
            Action::CanPlay {
                room_id,
                participant_id,
            } => ActionOutcome::CanPlay(service.can_play(&room_id, &participant_id).await?),
            Action::Relive {
                room_id,
                participant_id,
            } => {
                service.relive(&room_id, &participant_id).await?;
                ActionOutcome::Done
            }
            Action::InviteRequest {
                room_id,
                invitee_id,
            } => {
                service.invite_request(&room_id, &invitee_id).await?;
                ActionOutcome::Done
            }
            Action::InviteEnd { room_id } => {
                service.invite_end(&room_id).await?;
                ActionOutcome::Done
            }
            Action::InviteResponse {
                room_id,
                invitee_id,
                accept,
                media_uid,
            } => {
                service
                    .invite_response(&room_id, &invitee_id, accept, &media_uid)
                    .await?;
                ActionOutcome::Done
            }
            Action::SetQuizSet {
                room_id,
                quizzes,
                timeout,
            } => {
                service.set_quiz_set(&room_id, quizzes, timeout).await?;
                ActionOutcome::Done
            }
        };
        Ok(outcome)
    }
}
