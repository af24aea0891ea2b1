//! Message listing endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::error;

use crate::routes::{find_public_text_channel, not_joined};
use crate::AppState;

/// Maximum number of messages returned per request
const MAX_MESSAGES: u16 = 500;

/// Query parameters for listing messages
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Channel name; the first public text channel when omitted
    pub channel: Option<String>,
    /// Maximum number of messages (default 25, capped at 500)
    pub limit: Option<u16>,
}

/// Create message routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/messages", get(get_messages))
}

/// GET /messages?channel=&limit= - Recent messages of a public text channel
async fn get_messages(
    State(state): State<AppState>,
    Query(params): Query<MessagesQuery>,
) -> impl IntoResponse {
    let Some(guild_id) = state.bot.primary_guild().await else {
        return not_joined();
    };
    let client = state.bot.client();

    let channels = match client.guild_channels(guild_id).await {
        Ok(channels) => channels,
        Err(e) => {
            error!("Failed to list guild channels: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("Failed to list channels: {}", e)
                })),
            )
                .into_response();
        }
    };

    let Some(channel) = find_public_text_channel(&channels, params.channel.as_deref(), guild_id)
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Text channel not found."
            })),
        )
            .into_response();
    };

    let limit = params.limit.unwrap_or(25).clamp(1, MAX_MESSAGES);

    match client.channel_messages(channel.id, limit).await {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(e) => {
            error!("Failed to fetch messages: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("Failed to fetch messages: {}", e)
                })),
            )
                .into_response()
        }
    }
}
