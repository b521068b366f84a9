//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::batch::BatchStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_version: Option<String>,
    pub uptime_seconds: u64,
    pub store: StoreHealthResponse,
    pub template_cache: CacheHealthResponse,
    pub batches: BatchStatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct CacheHealthResponse {
    pub entries: usize,
    pub ttl_seconds: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        application_version: state.settings.application_version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreHealthResponse {
            backend: state.cache.backend_name().to_string(),
            location: state.settings.store.location.clone(),
        },
        template_cache: CacheHealthResponse {
            entries: state.cache.len(),
            ttl_seconds: state.cache.ttl().as_secs(),
        },
        batches: state.processor.stats(),
    })
}
