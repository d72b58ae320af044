//! Shopgraph Web Server
//!
//! Axum server exposing the liveness probe.

pub mod routes;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
}

/// Run the web server until the task is dropped or the listener fails.
pub async fn run_server(host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router();

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Health endpoint listening on http://{}:{}/health", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
