//! Terrain50 Service - HTTP microservice for OS Terrain 50 height queries.
//!
//! A REST API for querying elevations from OS Terrain 50 tile archives.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TERRAIN50_DATA_DIR` | Directory containing tile archives | Required |
//! | `TERRAIN50_ARCHIVE_SUFFIX` | Archive filename suffix | distribution default |
//! | `TERRAIN50_PORT` | HTTP server port | 9091 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /v4/height/:gridref` - Height at a national grid reference
//! - `GET /health` - Health check
//! - `GET /stats` - Cache and counter statistics
//! - `GET /metrics` - Prometheus text exposition

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use terrain50::TerrainServiceBuilder;
use terrain50_service::{handlers, AppState};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terrain50_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("TERRAIN50_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9091);

    // The library handles TERRAIN50_DATA_DIR and TERRAIN50_ARCHIVE_SUFFIX
    let terrain = match TerrainServiceBuilder::from_env() {
        Ok(builder) => builder.build(),
        Err(_) => {
            tracing::warn!("TERRAIN50_DATA_DIR not set, using current directory");
            TerrainServiceBuilder::new(".").build()
        }
    };

    tracing::info!(port = port, "Starting terrain50 service");

    let state = Arc::new(AppState { terrain });

    let app = Router::new()
        .route("/v4/height/:gridref", get(handlers::get_height))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .route("/metrics", get(handlers::get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
