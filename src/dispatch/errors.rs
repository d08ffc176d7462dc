use thiserror::Error;

use crate::room::RoomError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Request is missing information: {0}")]
    InfoMissing(String),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("Processing of message {0} was interrupted")]
    Interrupted(String),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::InfoMissing(_) => "info_missing",
            DispatchError::Room(e) => e.code(),
            DispatchError::Interrupted(_) => "interrupted",
        }
    }
}
