use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livequiz::{
    cipher::build_codec,
    dispatch::MessageDispatcher,
    quiz::FileQuizCatalog,
    room::{repository::InMemoryRoomRepository, RoomService},
    websockets::InMemoryConnectionManager,
    AppConfig, AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "livequiz=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        quiz_dir = %config.quiz_dir.display(),
        cipher = %config.cipher,
        "Starting live quiz server"
    );

    let codec = build_codec(config.cipher, config.cipher_secret.as_deref())?;
    let connection_manager = Arc::new(InMemoryConnectionManager::new());
    let room_service = RoomService::new(
        Arc::new(InMemoryRoomRepository::new(config.default_timeout_secs)),
        Arc::new(FileQuizCatalog::new(config.quiz_dir.clone())),
        connection_manager.clone(),
        codec,
    );
    let dispatcher = Arc::new(MessageDispatcher::new(
        Arc::new(room_service),
        config.dedup.clone(),
    ));

    let app = livequiz::router(AppState::new(dispatcher, connection_manager));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
