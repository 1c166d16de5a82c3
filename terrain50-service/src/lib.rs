//! Terrain50 Service Library
//!
//! HTTP handlers and types for the OS Terrain 50 elevation service.
//! This library is used by both the terrain50-service binary and
//! integration tests.

pub mod handlers;

use terrain50::TerrainService;

/// Application state shared across handlers.
pub struct AppState {
    /// Terrain service for height queries.
    pub terrain: TerrainService,
}

// Re-export commonly used types for convenience
pub use handlers::{ErrorResponse, HealthResponse, HeightResponse, StatsResponse};
