use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{
    models::Room,
    types::{
        AnswerRequest, ApiResponse, InviteResponseRequest, MessageRequest, ParticipantRequest,
        RequestChannelRequest, RoomRequest, SetQuizRequest,
    },
};
use crate::dispatch::{Action, ActionOutcome};
use crate::quiz::quiz_set_for_language;
use crate::shared::{AppError, AppState, JsonBody};
use crate::websockets::WebSocketMessage;

/// Parses and runs an action built from a REST body
async fn run(state: &AppState, action: &str, params: Value) -> Result<ActionOutcome, AppError> {
    let action = Action::parse(action, params)?;
    Ok(state.dispatcher.execute(action).await?)
}

async fn respond(state: &AppState, action: &str, params: Value) -> Result<Json<ApiResponse>, AppError> {
    let outcome = run(state, action, params).await?;
    Ok(Json(ApiResponse::ok(outcome.data())))
}

/// POST /v1/requestChannel
///
/// Creates the room (or reuses it with a fresh quiz set). A room id is
/// generated when `gid` is omitted.
#[instrument(name = "request_channel", skip(state))]
pub async fn request_channel(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RequestChannelRequest>,
) -> Result<Json<WebSocketMessage>, AppError> {
    let room_id = request
        .gid
        .filter(|gid| !gid.trim().is_empty())
        .unwrap_or_else(Room::generate_id);
    let quiz_set_name = request
        .quiz
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| quiz_set_for_language(request.question_language.as_deref()).to_string());

    let outcome = run(
        &state,
        "createOrReuseRoom",
        json!({
            "roomId": room_id,
            "quizSetName": quiz_set_name,
            "encryptionMode": request.encrypt,
        }),
    )
    .await?;

    let room_id = match outcome {
        ActionOutcome::RoomReady(id) => id,
        _ => room_id,
    };
    info!(room_id = %room_id, quiz_set = %quiz_set_name, "Channel ready");
    Ok(Json(WebSocketMessage::channel(&room_id)))
}

/// POST /v1/publish
#[instrument(name = "publish", skip(state))]
pub async fn publish(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RoomRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(&state, "publish", json!({ "roomId": request.gid })).await
}

/// POST /v1/stopAnswer
#[instrument(name = "stop_answer", skip(state))]
pub async fn stop_answer(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RoomRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(&state, "closeQuiz", json!({ "roomId": request.gid })).await
}

/// POST /v1/reset
#[instrument(name = "reset", skip(state))]
pub async fn reset(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RoomRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(&state, "reset", json!({ "roomId": request.gid })).await
}

/// POST /v1/answer
#[instrument(name = "answer", skip(state))]
pub async fn answer(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AnswerRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(
        &state,
        "commitAnswer",
        json!({
            "roomId": request.gid,
            "participantId": request.uid,
            "sequenceId": request.sid,
            "optionIndex": request.result,
        }),
    )
    .await
}

/// GET /v1/canplay?gid=&uid=
#[instrument(name = "can_play", skip(state))]
pub async fn can_play(
    State(state): State<AppState>,
    Query(request): Query<ParticipantRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = run(
        &state,
        "canPlay",
        json!({ "roomId": request.gid, "participantId": request.uid }),
    )
    .await?;
    Ok(Json(outcome.data()))
}

/// POST /v1/relive
#[instrument(name = "relive", skip(state))]
pub async fn relive(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ParticipantRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(
        &state,
        "relive",
        json!({ "roomId": request.gid, "participantId": request.uid }),
    )
    .await
}

/// POST /v1/inviteRequest
#[instrument(name = "invite_request", skip(state))]
pub async fn invite_request(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ParticipantRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(
        &state,
        "inviteRequest",
        json!({ "roomId": request.gid, "inviteeId": request.uid }),
    )
    .await
}

/// POST /v1/inviteEnd
#[instrument(name = "invite_end", skip(state))]
pub async fn invite_end(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RoomRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(&state, "inviteEnd", json!({ "roomId": request.gid })).await
}

/// POST /v1/inviteResponse
#[instrument(name = "invite_response", skip(state))]
pub async fn invite_response(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<InviteResponseRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(
        &state,
        "inviteResponse",
        json!({
            "roomId": request.gid,
            "inviteeId": request.account,
            "accept": request.accept,
            "mediaUid": request.media_uid,
        }),
    )
    .await
}

/// POST /v1/quiz
///
/// Replaces the room's quiz set with the one in the body and resets the room.
#[instrument(name = "set_quiz", skip(state, request))]
pub async fn set_quiz(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SetQuizRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    respond(
        &state,
        "setQuizSet",
        json!({
            "roomId": request.gid,
            "quizzes": request.quiz,
            "timeout": request.timeout,
        }),
    )
    .await
}

/// POST /v1/message
///
/// Generic entry point with duplicate detection on `mid`.
#[instrument(name = "message", skip(state, request))]
pub async fn message(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<MessageRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let outcome = state
        .dispatcher
        .process(
            request.channel.as_deref(),
            request.mid.as_deref(),
            request.action.as_deref(),
            request.params,
        )
        .await?;
    Ok(Json(ApiResponse::ok(outcome.data())))
}
