//! HTTP endpoints for operators: a roster snapshot and a health check.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Extension, Json, Router, routing::get};
use plaza_hub::PlayerSnapshot;
use plaza_protocol::SessionId;
use serde::Serialize;

use crate::server::ServerState;

/// Builds the HTTP router.
pub(crate) fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/players", get(players_handler))
        .route("/api/health", get(health_handler))
        .layer(Extension(state))
}

/// Response body of `GET /api/players`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersResponse {
    pub total_players: usize,
    pub players: Vec<PlayerEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub id: SessionId,
    pub display_name: String,
    pub x: f64,
    pub y: f64,
    pub authenticated: bool,
    /// Milliseconds since the player's last event.
    pub idle_ms: u64,
}

impl From<PlayerSnapshot> for PlayerEntry {
    fn from(p: PlayerSnapshot) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name,
            x: p.position.x,
            y: p.position.y,
            authenticated: p.authenticated,
            idle_ms: u64::try_from(p.idle.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Response body of `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub active_players: usize,
    pub uptime_seconds: u64,
}

async fn players_handler(
    Extension(state): Extension<Arc<ServerState>>,
) -> Result<Json<PlayersResponse>, StatusCode> {
    let players = state.hub.players().await.map_err(|e| {
        tracing::error!(error = %e, "roster request failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(PlayersResponse {
        total_players: players.len(),
        players: players.into_iter().map(PlayerEntry::from).collect(),
    }))
}

async fn health_handler(
    Extension(state): Extension<Arc<ServerState>>,
) -> Result<Json<HealthStatus>, StatusCode> {
    let stats = state.hub.stats().await.map_err(|e| {
        tracing::error!(error = %e, "health request failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_players: stats.sessions,
        uptime_seconds: state.started.elapsed().as_secs(),
    }))
}
