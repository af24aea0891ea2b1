//! API route definitions

mod events;
mod health;
mod members;
mod messages;
mod send;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use twilight_model::channel::permission_overwrite::PermissionOverwrite;
use twilight_model::channel::{Channel, ChannelType};
use twilight_model::guild::Permissions;
use twilight_model::id::marker::{GenericMarker, GuildMarker};
use twilight_model::id::Id;

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(messages::routes())
        .merge(events::routes())
        .merge(members::routes())
        .merge(send::routes())
        .merge(health::routes())
}

/// Reject requests without the configured bearer token
///
/// A no-op when no token is configured.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = &state.api_token else {
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected);

    if authorized {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Invalid or missing API token."
            })),
        )
            .into_response()
    }
}

/// Response for requests arriving before the bot has joined a guild
pub(crate) fn not_joined() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({
            "error": "Not connected to a guild yet."
        })),
    )
        .into_response()
}

/// Find a guild text channel the everyone role can view
///
/// Private channels are never exposed through the API. When `name` is given
/// only a channel with exactly that name matches; otherwise the first
/// public text channel in listing order is returned.
pub(crate) fn find_public_text_channel<'a>(
    channels: &'a [Channel],
    name: Option<&str>,
    guild_id: Id<GuildMarker>,
) -> Option<&'a Channel> {
    channels.iter().find(|channel| {
        channel.kind == ChannelType::GuildText
            && everyone_can_view(channel.permission_overwrites.as_deref(), guild_id.cast())
            && name.is_none_or(|wanted| channel.name.as_deref() == Some(wanted))
    })
}

/// Whether the everyone role is allowed to view a channel
///
/// The everyone role shares the guild's id; a channel is hidden when an
/// overwrite for that role denies `VIEW_CHANNEL`.
pub(crate) fn everyone_can_view(
    overwrites: Option<&[PermissionOverwrite]>,
    everyone: Id<GenericMarker>,
) -> bool {
    overwrites
        .unwrap_or_default()
        .iter()
        .all(|overwrite| !(overwrite.id == everyone && overwrite.deny.contains(Permissions::VIEW_CHANNEL)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use twilight_model::channel::permission_overwrite::PermissionOverwriteType;

    fn deny_view(id: u64) -> PermissionOverwrite {
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            id: Id::new(id),
            kind: PermissionOverwriteType::Role,
        }
    }

    #[test]
    fn test_everyone_can_view_without_overwrites() {
        assert!(everyone_can_view(None, Id::new(1)));
        assert!(everyone_can_view(Some(&[]), Id::new(1)));
    }

    #[test]
    fn test_everyone_can_view_denied() {
        let overwrites = [deny_view(1)];
        assert!(!everyone_can_view(Some(&overwrites), Id::new(1)));
    }

    #[test]
    fn test_everyone_can_view_other_role_denied() {
        // A deny on some other role does not hide the channel from everyone
        let overwrites = [deny_view(2)];
        assert!(everyone_can_view(Some(&overwrites), Id::new(1)));
    }

    #[test]
    fn test_everyone_can_view_send_only_deny() {
        let overwrites = [PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::SEND_MESSAGES,
            id: Id::new(1),
            kind: PermissionOverwriteType::Role,
        }];
        assert!(everyone_can_view(Some(&overwrites), Id::new(1)));
    }
}
