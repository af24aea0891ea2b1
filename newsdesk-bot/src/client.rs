//! Discord API client wrapper

use std::sync::Arc;

use twilight_http::Client as HttpClient;
use twilight_model::channel::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::channel::{Channel, ChannelType, Message};
use twilight_model::guild::scheduled_event::GuildScheduledEvent;
use twilight_model::guild::{Member, Permissions, Role};
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker};
use twilight_model::id::Id;

/// Page size for member listing requests
const MEMBER_PAGE_SIZE: u16 = 1000;

/// Page size for message history requests
const MESSAGE_PAGE_SIZE: u16 = 100;

/// Discord client wrapping the remote channel, member and message operations
/// the bot relies on
pub struct DiscordClient {
    http: Arc<HttpClient>,
}

impl DiscordClient {
    /// Create a new Discord client
    pub fn new(token: String) -> Self {
        Self {
            http: Arc::new(HttpClient::new(token)),
        }
    }

    /// List every channel in a guild, in listing order
    pub async fn guild_channels(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<Vec<Channel>, DiscordClientError> {
        self.http
            .guild_channels(guild_id)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .models()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))
    }

    /// List every role in a guild
    pub async fn guild_roles(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<Vec<Role>, DiscordClientError> {
        self.http
            .roles(guild_id)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .models()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))
    }

    /// Fetch the complete member list of a guild, paginating until exhausted
    pub async fn guild_members(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<Vec<Member>, DiscordClientError> {
        let mut members = Vec::new();
        let mut after: Option<Id<UserMarker>> = None;

        loop {
            let mut request = self.http.guild_members(guild_id).limit(MEMBER_PAGE_SIZE);
            if let Some(after_id) = after {
                request = request.after(after_id);
            }

            let page = request
                .await
                .map_err(|e| DiscordClientError::Http(e.to_string()))?
                .models()
                .await
                .map_err(|e| DiscordClientError::Deserialization(e.to_string()))?;

            let last = page.last().map(|member| member.user.id);
            let exhausted = page.len() < MEMBER_PAGE_SIZE as usize;
            members.extend(page);

            match last {
                Some(last_id) if !exhausted => after = Some(last_id),
                _ => break,
            }
        }

        Ok(members)
    }

    /// Create a category channel hidden from the everyone role
    pub async fn create_locked_category(
        &self,
        guild_id: Id<GuildMarker>,
        name: &str,
    ) -> Result<Channel, DiscordClientError> {
        let overwrites = hidden_overwrites(guild_id);
        self.http
            .create_guild_channel(guild_id, name)
            .kind(ChannelType::GuildCategory)
            .permission_overwrites(&overwrites)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .model()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))
    }

    /// Create a voice channel hidden from the everyone role, used purely as
    /// a statistic display
    pub async fn create_locked_voice_channel(
        &self,
        guild_id: Id<GuildMarker>,
        parent: Id<ChannelMarker>,
        name: &str,
    ) -> Result<Channel, DiscordClientError> {
        let overwrites = hidden_overwrites(guild_id);
        self.http
            .create_guild_channel(guild_id, name)
            .kind(ChannelType::GuildVoice)
            .parent_id(parent)
            .permission_overwrites(&overwrites)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .model()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))
    }

    /// Rename a channel
    pub async fn rename_channel(
        &self,
        channel_id: Id<ChannelMarker>,
        name: &str,
    ) -> Result<(), DiscordClientError> {
        self.http
            .update_channel(channel_id)
            .name(name)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?;
        Ok(())
    }

    /// Delete a message
    pub async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), DiscordClientError> {
        self.http
            .delete_message(channel_id, message_id)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?;
        Ok(())
    }

    /// Open a discussion thread on a message
    pub async fn create_thread(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        name: &str,
    ) -> Result<Channel, DiscordClientError> {
        self.http
            .create_thread_from_message(channel_id, message_id, name)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .model()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))
    }

    /// Send a text message to a channel
    pub async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
    ) -> Result<Message, DiscordClientError> {
        self.http
            .create_message(channel_id)
            .content(content)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .model()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))
    }

    /// Open (or fetch the existing) private channel with a user
    pub async fn open_private_channel(
        &self,
        user_id: Id<UserMarker>,
    ) -> Result<Id<ChannelMarker>, DiscordClientError> {
        let channel = self
            .http
            .create_private_channel(user_id)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .model()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))?;

        Ok(channel.id)
    }

    /// Fetch the most recent messages of a channel, newest first
    pub async fn channel_messages(
        &self,
        channel_id: Id<ChannelMarker>,
        limit: u16,
    ) -> Result<Vec<Message>, DiscordClientError> {
        let mut messages: Vec<Message> = Vec::new();

        while (messages.len() as u16) < limit {
            let remaining = limit - messages.len() as u16;
            let page_size = remaining.min(MESSAGE_PAGE_SIZE);

            let page = if let Some(oldest) = messages.last() {
                self.http
                    .channel_messages(channel_id)
                    .limit(page_size)
                    .before(oldest.id)
                    .await
                    .map_err(|e| DiscordClientError::Http(e.to_string()))?
                    .models()
                    .await
                    .map_err(|e| DiscordClientError::Deserialization(e.to_string()))?
            } else {
                self.http
                    .channel_messages(channel_id)
                    .limit(page_size)
                    .await
                    .map_err(|e| DiscordClientError::Http(e.to_string()))?
                    .models()
                    .await
                    .map_err(|e| DiscordClientError::Deserialization(e.to_string()))?
            };

            let exhausted = page.len() < page_size as usize;
            messages.extend(page);
            if exhausted {
                break;
            }
        }

        Ok(messages)
    }

    /// List a guild's scheduled events
    pub async fn guild_scheduled_events(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<Vec<GuildScheduledEvent>, DiscordClientError> {
        self.http
            .guild_scheduled_events(guild_id)
            .await
            .map_err(|e| DiscordClientError::Http(e.to_string()))?
            .models()
            .await
            .map_err(|e| DiscordClientError::Deserialization(e.to_string()))
    }
}

/// Permission overwrites denying channel visibility to the everyone role
fn hidden_overwrites(guild_id: Id<GuildMarker>) -> [PermissionOverwrite; 1] {
    // the everyone role shares the guild's id
    [PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::VIEW_CHANNEL,
        id: guild_id.cast(),
        kind: PermissionOverwriteType::Role,
    }]
}

/// Errors that can occur when using the Discord client
#[derive(Debug, thiserror::Error)]
pub enum DiscordClientError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
