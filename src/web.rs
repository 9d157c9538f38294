use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::Result;
use crate::api;
use crate::config::ServerConfig;
use crate::service::SearchService;

/// Serve the API until Ctrl-C
pub async fn run(config: &ServerConfig, service: Arc<SearchService>) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(service).layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Weather journal listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, draining connections");
}
