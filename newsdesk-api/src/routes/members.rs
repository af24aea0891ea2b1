//! Member lookup endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use twilight_model::guild::{Member, Role};
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_model::id::Id;
use twilight_model::user::User;

use crate::routes::not_joined;
use crate::AppState;

/// Query parameters for member lookup
#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    /// Exact member id
    pub id: Option<String>,
    /// Tag prefix, e.g. `someone#1234` or just `someone`
    pub tag: Option<String>,
}

/// Member details returned by the API
#[derive(Debug, Serialize)]
pub struct MemberSummary {
    pub id: String,
    pub tag: String,
    pub display_name: String,
    /// Highest colored role's color as `#rrggbb`, null when unset
    pub display_color: Option<String>,
    pub avatar_url: Option<String>,
}

/// Create member routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/member", get(get_member))
}

/// GET /member?id=|tag= - Look up a guild member
async fn get_member(
    State(state): State<AppState>,
    Query(params): Query<MemberQuery>,
) -> impl IntoResponse {
    let Some(guild_id) = state.bot.primary_guild().await else {
        return not_joined();
    };
    let client = state.bot.client();

    let (members, roles) = match (
        client.guild_members(guild_id).await,
        client.guild_roles(guild_id).await,
    ) {
        (Ok(members), Ok(roles)) => (members, roles),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to list guild members: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("Failed to list members: {}", e)
                })),
            )
                .into_response();
        }
    };

    let member = members.iter().find(|member| {
        params
            .id
            .as_deref()
            .is_some_and(|id| member.user.id.to_string() == id)
            || params
                .tag
                .as_deref()
                .is_some_and(|tag| user_tag(&member.user).starts_with(tag))
    });

    match member {
        Some(member) => (
            StatusCode::OK,
            Json(member_summary(member, &roles, guild_id)),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Member not found."
            })),
        )
            .into_response(),
    }
}

fn member_summary(member: &Member, roles: &[Role], guild_id: Id<GuildMarker>) -> MemberSummary {
    MemberSummary {
        id: member.user.id.to_string(),
        tag: user_tag(&member.user),
        display_name: display_name(member),
        display_color: display_color(&member.roles, roles),
        avatar_url: avatar_url(member, guild_id),
    }
}

/// A user's tag; legacy accounts keep their discriminator suffix
fn user_tag(user: &User) -> String {
    format_tag(&user.name, user.discriminator)
}

fn format_tag(name: &str, discriminator: u16) -> String {
    if discriminator == 0 {
        name.to_string()
    } else {
        format!("{}#{:04}", name, discriminator)
    }
}

/// Guild nickname, global display name or account name, in that order
fn display_name(member: &Member) -> String {
    member
        .nick
        .clone()
        .or_else(|| member.user.global_name.clone())
        .unwrap_or_else(|| member.user.name.clone())
}

/// Color of the member's highest colored role, if any
fn display_color(member_roles: &[Id<RoleMarker>], roles: &[Role]) -> Option<String> {
    roles
        .iter()
        .filter(|role| member_roles.contains(&role.id) && role.color != 0)
        .max_by_key(|role| role.position)
        .map(|role| format!("#{:06x}", role.color))
}

/// Guild avatar when set, account avatar otherwise
fn avatar_url(member: &Member, guild_id: Id<GuildMarker>) -> Option<String> {
    if let Some(hash) = member.avatar {
        return Some(format!(
            "https://cdn.discordapp.com/guilds/{}/users/{}/avatars/{}.png",
            guild_id, member.user.id, hash
        ));
    }

    member.user.avatar.map(|hash| {
        format!(
            "https://cdn.discordapp.com/avatars/{}/{}.png",
            member.user.id, hash
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tag_legacy_discriminator() {
        assert_eq!(format_tag("someone", 42), "someone#0042");
        assert_eq!(format_tag("someone", 1234), "someone#1234");
    }

    #[test]
    fn test_format_tag_modern_username() {
        assert_eq!(format_tag("someone", 0), "someone");
    }

    #[test]
    fn test_display_color_picks_highest_colored_role() {
        let roles = vec![
            role(1, 0x00ff00, 5),
            role(2, 0, 10),
            role(3, 0xff0000, 2),
        ];
        let member_roles = vec![Id::new(1), Id::new(2), Id::new(3)];

        // role 2 is highest but colorless, so role 1 wins
        assert_eq!(
            display_color(&member_roles, &roles),
            Some("#00ff00".to_string())
        );
    }

    #[test]
    fn test_display_color_none_when_uncolored() {
        let roles = vec![role(1, 0, 5)];
        assert_eq!(display_color(&[Id::new(1)], &roles), None);
        assert_eq!(display_color(&[], &roles), None);
    }

    fn role(id: u64, color: u32, position: i64) -> Role {
        Role {
            color,
            colors: twilight_model::guild::RoleColors {
                primary_color: color,
                secondary_color: None,
                tertiary_color: None,
            },
            hoist: false,
            icon: None,
            id: Id::new(id),
            managed: false,
            mentionable: false,
            name: format!("role-{}", id),
            permissions: twilight_model::guild::Permissions::empty(),
            position,
            flags: twilight_model::guild::RoleFlags::empty(),
            tags: None,
            unicode_emoji: None,
        }
    }
}
