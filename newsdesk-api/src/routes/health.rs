//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    guild_joined: bool,
}

/// Health check handler
///
/// Degraded until the bot has joined a guild.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let guild_joined = state.bot.primary_guild().await.is_some();

    let (status, code) = if guild_joined {
        ("healthy", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            guild_joined,
        }),
    )
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
