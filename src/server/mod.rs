//! HTTP serving layer
//!
//! A thin REST front-end over the inference service. All schema and
//! vocabulary knowledge lives inside the artifact; this layer only routes
//! requests and maps errors to status codes.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::inference::InferenceService;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Well-known artifact path, also used by `/api/reload`
    pub artifact_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            artifact_path: std::env::var("ARTIFACT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models/loan_pipeline.bin")),
        }
    }
}

/// Start the server. Fails fast before binding if the artifact cannot be
/// loaded: the process must not serve without a valid model.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let service = InferenceService::from_path(&config.artifact_path)?;
    let state = Arc::new(AppState::new(config.clone(), service));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        artifact = %config.artifact_path.display(),
        "underwriter server starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "server listening");

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("shutdown signal received, stopping server");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("server shut down cleanly");
    Ok(())
}
