//! Message sending endpoint

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::routes::{find_public_text_channel, not_joined};
use crate::AppState;

/// Request body for sending a message
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Target channel name
    pub channel: String,
    /// Message content
    pub message: String,
}

/// Create send routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/send", post(send_message))
}

/// POST /send {channel, message} - Send a message to a public text channel
async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> impl IntoResponse {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Message cannot be empty."
            })),
        )
            .into_response();
    }

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

    let Some(channel) = find_public_text_channel(&channels, Some(&request.channel), guild_id)
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Text channel not found."
            })),
        )
            .into_response();
    };

    match client.send_message(channel.id, &request.message).await {
        Ok(message) => {
            info!("Sent message to #{} via API", request.channel);
            (StatusCode::OK, Json(message)).into_response()
        }
        Err(e) => {
            error!("Failed to send message: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("Failed to send message: {}", e)
                })),
            )
                .into_response()
        }
    }
}
