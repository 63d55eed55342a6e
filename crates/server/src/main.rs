//! Kinship server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use kinship_api::{AppState, app};
use kinship_common::Config;
use kinship_core::{DbCoworkingStatus, DbFriendshipStore, DbUserDirectory, FriendshipService};
use kinship_db::repositories::{FriendshipRepository, UserRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinship=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting kinship server...");

    let config = Config::load()?;

    let db = Arc::new(kinship_db::init(&config.database).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    kinship_db::migrate(&db).await?;
    info!("Migrations completed");

    let user_repo = UserRepository::new(Arc::clone(&db));
    let friendship_repo = FriendshipRepository::new(Arc::clone(&db));

    let friendship_service = FriendshipService::new(
        Arc::new(DbFriendshipStore::new(friendship_repo, user_repo.clone())),
        Arc::new(DbUserDirectory::new(user_repo.clone())),
        Arc::new(DbCoworkingStatus::new(user_repo)),
    );

    let router = app(AppState::new(friendship_service))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
