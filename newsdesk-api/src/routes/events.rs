//! Scheduled event listing endpoint

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use tracing::error;

use crate::routes::not_joined;
use crate::AppState;

/// Create event routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(get_events))
}

/// GET /events - The guild's scheduled events
async fn get_events(State(state): State<AppState>) -> impl IntoResponse {
    let Some(guild_id) = state.bot.primary_guild().await else {
        return not_joined();
    };

    match state.bot.client().guild_scheduled_events(guild_id).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => {
            error!("Failed to fetch scheduled events: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("Failed to fetch events: {}", e)
                })),
            )
                .into_response()
        }
    }
}
