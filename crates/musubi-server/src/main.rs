//! Musubi Server: application entry point.

use musubi_db::DbManager;
use musubi_server::auth::TokenVerifier;
use musubi_server::config::ServerConfig;
use musubi_server::push::FcmPushSender;
use musubi_server::{AppState, app};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("musubi=info".parse()?))
        .json()
        .init();

    info!("Starting Musubi server...");

    let config = ServerConfig::from_env()?;
    let db = DbManager::connect_and_migrate(&config.db).await?;
    let verifier = TokenVerifier::new(&config.token)?;
    let sender = FcmPushSender::new(&config.fcm);

    let state = AppState::new(db.handle(), sender, verifier, config.service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Musubi server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
