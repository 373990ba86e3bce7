use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::aggregator::Aggregator;
use crate::store::SnapshotStore;

// ── Shared state ────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub aggregator: Arc<Aggregator>,
    pub start_time: Instant,
}

/// The one error HTTP consumers see. Adapter failures surface as
/// degraded records inside a well-formed snapshot, never as a 5xx.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Device not found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ── Router ──────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/devices", get(list_devices))
        .route("/api/devices/:id", get(get_device))
        .route("/api/devices/:id/sync", post(sync_device))
        .route("/api/services", get(list_services))
        .route("/api/services/containers", get(containers))
        .route("/api/trading", get(trading))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ── Handlers ────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "homedash",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "health": "/health",
            "status": "/api/status",
            "devices": "/api/devices",
            "services": "/api/services",
            "trading": "/api/trading",
        },
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}

async fn status(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = s.store.current();
    Json(json!({
        "status": "online",
        "lastUpdate": snap.last_update,
        "uptime": s.start_time.elapsed().as_secs_f64(),
        "data": {
            "devices": snap.devices,
            "services": snap.services,
            "threats": snap.threats,
            "opportunities": snap.opportunities,
            "trading": snap.trading,
        },
    }))
}

async fn list_devices(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.store.current().devices.clone())
}

async fn get_device(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snap = s.store.current();
    let device = snap
        .devices
        .iter()
        .find(|d| d.id == id)
        .cloned()
        .ok_or(ApiError::NotFound)?;
    Ok(Json(device))
}

/// On-demand device fetch, bypassing the scheduler and the store. An
/// unreachable device answers with its degraded offline record.
async fn sync_device(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let adapter = s.aggregator.device(&id).ok_or(ApiError::NotFound)?;

    let status = match adapter.fetch_status().await {
        Ok(status) => status,
        Err(e) => {
            warn!("On-demand sync of {id} failed: {e}");
            adapter.offline_status()
        }
    };

    Ok(Json(json!({ "message": "Sync triggered", "status": status })))
}

async fn list_services(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.store.current().services.clone())
}

/// First host's container report, or `[]` before any host data exists.
async fn containers(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = s.store.current();
    match snap.services.first() {
        Some(host) => Json(json!(host.containers)),
        None => Json(json!([])),
    }
}

async fn trading(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.store.current().trading.clone())
}
