use serde::{Deserialize, Serialize};
use serde_json::Value;

// Request fields are optional so a missing one becomes `info_missing`
// rather than axum's generic rejection.

#[derive(Debug, Deserialize)]
pub struct RequestChannelRequest {
    pub gid: Option<String>,
    pub quiz: Option<String>,
    #[serde(rename = "QuestionLanguage")]
    pub question_language: Option<String>,
    pub encrypt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomRequest {
    pub gid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    pub gid: Option<String>,
    pub uid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub gid: Option<String>,
    pub uid: Option<String>,
    /// Sequence the client believes is open
    pub sid: Option<Value>,
    /// Chosen option index
    pub result: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponseRequest {
    pub gid: Option<String>,
    pub account: Option<String>,
    pub accept: Option<Value>,
    pub media_uid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetQuizRequest {
    pub gid: Option<String>,
    pub quiz: Option<Value>,
    pub timeout: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub channel: Option<String>,
    pub mid: Option<String>,
    pub action: Option<String>,
    pub params: Option<Value>,
}

/// Body returned by the action endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub err: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self { err: None, data }
    }
}
