// Public API - what other modules can use
pub use errors::{PlayDenied, RoomError};
pub use handlers::{
    answer, can_play, invite_end, invite_request, invite_response, message, publish, relive,
    request_channel, reset, set_quiz, stop_answer,
};
pub use models::{CanPlay, Phase, Room, RoundSummary};
pub use service::RoomService;

// Internal modules
mod errors;
mod handlers;
pub mod models;
pub mod repository;
mod service;
mod types;
