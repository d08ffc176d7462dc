use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};
use strum_macros::IntoStaticStr;

use super::errors::DispatchError;
use crate::quiz::{parse_quiz_set, Quiz, QuizPayload};
use crate::room::CanPlay;

/// Every operation a caller can ask of the room layer, validated at the boundary
#[derive(Debug, Clone, PartialEq, Deserialize, IntoStaticStr)]
#[serde(tag = "action", content = "params", rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Action {
    #[serde(rename_all = "camelCase")]
    CreateOrReuseRoom {
        room_id: String,
        quiz_set_name: String,
        #[serde(default)]
        encryption_mode: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Publish { room_id: String },
    #[serde(rename_all = "camelCase")]
    CloseQuiz { room_id: String },
    #[serde(rename_all = "camelCase")]
    Reset { room_id: String },
    #[serde(rename_all = "camelCase")]
    CommitAnswer {
        room_id: String,
        participant_id: String,
        #[serde(deserialize_with = "parse_index")]
        sequence_id: usize,
        #[serde(deserialize_with = "parse_index")]
        option_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    CanPlay {
        room_id: String,
        participant_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Relive {
        room_id: String,
        participant_id: String,
    },
    #[serde(rename_all = "camelCase")]
    InviteRequest { room_id: String, invitee_id: String },
    #[serde(rename_all = "camelCase")]
    InviteEnd { room_id: String },
    #[serde(rename_all = "camelCase")]
    InviteResponse {
        room_id: String,
        invitee_id: String,
        #[serde(deserialize_with = "parse_flag")]
        accept: bool,
        media_uid: String,
    },
    #[serde(rename_all = "camelCase")]
    SetQuizSet {
        room_id: String,
        #[serde(deserialize_with = "parse_quizzes")]
        quizzes: Vec<Quiz>,
        #[serde(default, deserialize_with = "parse_timeout")]
        timeout: Option<u32>,
    },
}

impl Action {
    /// Builds an action from its name and a params object
    pub fn parse(action: &str, params: Value) -> Result<Self, DispatchError> {
        if !params.is_object() {
            return Err(DispatchError::InfoMissing(format!(
                "params for {} must be an object",
                action
            )));
        }

        let parsed: Action = serde_json::from_value(json!({ "action": action, "params": params }))
            .map_err(|e| DispatchError::InfoMissing(e.to_string()))?;
        parsed.require_ids()?;
        Ok(parsed)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn room_id(&self) -> &str {
        match self {
            Action::CreateOrReuseRoom { room_id, .. }
            | Action::Publish { room_id }
            | Action::CloseQuiz { room_id }
            | Action::Reset { room_id }
            | Action::CommitAnswer { room_id, .. }
            | Action::CanPlay { room_id, .. }
            | Action::Relive { room_id, .. }
            | Action::InviteRequest { room_id, .. }
            | Action::InviteEnd { room_id }
            | Action::InviteResponse { room_id, .. }
            | Action::SetQuizSet { room_id, .. } => room_id,
        }
    }

    /// Identifiers must be present and non-empty
    fn require_ids(&self) -> Result<(), DispatchError> {
        let mut ids = vec![("roomId", self.room_id())];
        match self {
            Action::CreateOrReuseRoom { quiz_set_name, .. } => {
                ids.push(("quizSetName", quiz_set_name.as_str()))
            }
            Action::CommitAnswer { participant_id, .. }
            | Action::CanPlay { participant_id, .. }
            | Action::Relive { participant_id, .. } => {
                ids.push(("participantId", participant_id.as_str()))
            }
            Action::InviteRequest { invitee_id, .. } | Action::InviteResponse { invitee_id, .. } => {
                ids.push(("inviteeId", invitee_id.as_str()))
            }
            _ => {}
        }

        match ids.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(DispatchError::InfoMissing(format!("{} is empty", field))),
            None => Ok(()),
        }
    }
}

/// What a successful action hands back to its caller
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    RoomReady(String),
    Published(QuizPayload),
    CanPlay(CanPlay),
    Done,
    /// Repeat of a message whose first delivery is still being processed
    Acknowledged,
}

impl ActionOutcome {
    pub fn data(&self) -> Value {
        match self {
            ActionOutcome::RoomReady(room_id) => json!(room_id),
            ActionOutcome::Published(payload) => json!(payload),
            ActionOutcome::CanPlay(check) => json!(check),
            ActionOutcome::Done | ActionOutcome::Acknowledged => Value::Null,
        }
    }
}

// Clients send numbers both as JSON numbers and as strings

fn parse_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| de::Error::custom(format!("{} is not a valid index", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("{:?} is not a valid index", s))),
        other => Err(de::Error::custom(format!("{} is not a valid index", other))),
    }
}

fn parse_timeout<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("{} is not a valid timeout", n))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("{:?} is not a valid timeout", s))),
        other => Err(de::Error::custom(format!("{} is not a valid timeout", other))),
    }
}

fn parse_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(de::Error::custom(format!("{:?} is not a flag", s))),
        },
        Value::Number(n) => Ok(n.as_u64() == Some(1)),
        other => Err(de::Error::custom(format!("{} is not a flag", other))),
    }
}

fn parse_quizzes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Quiz>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    parse_quiz_set(&raw).map_err(de::Error::custom)
}
