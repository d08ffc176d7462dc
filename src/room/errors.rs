use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

use crate::transport::TransportError;

/// Why a participant is not allowed to answer the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum PlayDenied {
    NotAPlayer,
    AlreadyEliminated,
}

/// Outcomes of room operations that did not succeed
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoomError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("A quiz is already open in this room")]
    QuizInProgress,

    #[error("No more quiz in this set")]
    NoMoreQuiz,

    #[error("Quiz is already closed")]
    AlreadyClosed,

    #[error("Quiz id {given} does not match current sequence {current}")]
    SequenceMismatch { given: usize, current: usize },

    #[error("Answers are not being accepted")]
    RoomClosed,

    #[error("Participant cannot play: {0}")]
    CannotPlay(PlayDenied),

    #[error("Answer already given for this quiz")]
    AlreadyAnswered,

    #[error("Option {option} is outside the {count} available options")]
    InvalidOption { option: usize, count: usize },

    #[error("Failed to load quiz set: {0}")]
    QuizLoadFailed(String),

    #[error("Transport failed: {0}")]
    TransportFailed(String),
}

impl RoomError {
    /// Stable wire code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::RoomNotFound(_) => "room_not_found",
            RoomError::QuizInProgress => "quiz_going_on",
            RoomError::NoMoreQuiz => "no_more_quiz",
            RoomError::AlreadyClosed => "game_closed_already",
            RoomError::SequenceMismatch { .. } => "incorrect_quiz_id",
            RoomError::RoomClosed => "game_closed",
            RoomError::CannotPlay(_) => "cannot_play",
            RoomError::AlreadyAnswered => "answer_given",
            RoomError::InvalidOption { .. } => "invalid_option",
            RoomError::QuizLoadFailed(_) => "quiz_load_failed",
            RoomError::TransportFailed(_) => "transport_failed",
        }
    }
}

impl From<TransportError> for RoomError {
    fn from(e: TransportError) -> Self {
        RoomError::TransportFailed(e.to_string())
    }
}
