//! HTTP front end: two CSV-upload prediction endpoints.
pub mod error;
pub mod handlers;
pub mod state;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::uploads::spawn_retention_sweeper;
pub use error::ApiError;
pub use state::AppState;

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/hospital_predict", post(handlers::hospital_predict))
        .route("/bacteria_predict", post(handlers::bacteria_predict))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state);
    if config.cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("[Prognos::Server] Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("[Prognos::Server] Shutting down");
}

/// Load the models, then bind and serve until interrupted.
pub async fn serve(config: ServerConfig) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.data_dir.display()
        )
    })?;
    let state = AppState::load(&config)?;
    let _sweeper = spawn_retention_sweeper(config.data_dir.clone(), &config.retention);

    let app = router(state, &config);
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(
        "[Prognos::Server] Listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}
