// Library crate for the live quiz server
// This file exposes the public API for integration tests

pub mod cipher;
pub mod config;
pub mod dispatch;
pub mod quiz;
pub mod room;
pub mod shared;
pub mod transport;
pub mod websockets;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use dispatch::{Action, ActionOutcome, DispatchError, MessageDispatcher};
pub use room::{models::Room, repository::RoomRepository, RoomError, RoomService};
pub use shared::{AppError, AppState};
pub use transport::{ChannelTransport, TransportError};
pub use websockets::{ConnectionManager, MessageType, WebSocketMessage};

/// All HTTP and WebSocket routes
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/v1/requestChannel", post(room::request_channel))
        .route("/v1/publish", post(room::publish))
        .route("/v1/stopAnswer", post(room::stop_answer))
        .route("/v1/reset", post(room::reset))
        .route("/v1/answer", post(room::answer))
        .route("/v1/canplay", get(room::can_play))
        .route("/v1/relive", post(room::relive))
        .route("/v1/inviteRequest", post(room::invite_request))
        .route("/v1/inviteEnd", post(room::invite_end))
        .route("/v1/inviteResponse", post(room::invite_response))
        .route("/v1/quiz", post(room::set_quiz))
        .route("/v1/message", post(room::message))
        .route("/ws/:room_id", get(websockets::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
