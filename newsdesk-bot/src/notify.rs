//! Guaranteed-delivery user notifications
//!
//! A notification is first attempted through the recipient's private
//! channel. If that fails (typically because the user has direct messages
//! disabled) and a public fallback channel is available, the message is
//! posted there instead, tagged to the recipient, and deleted again after a
//! configured decay period. Only when both attempts fail does the error
//! reach the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use twilight_model::channel::Message;
use twilight_model::id::marker::{ChannelMarker, MessageMarker, UserMarker};
use twilight_model::id::Id;

use crate::client::{DiscordClient, DiscordClientError};

/// Delivers informational messages to users, private channel first
pub struct Notifier {
    client: Arc<DiscordClient>,
    decay: Duration,
}

impl Notifier {
    /// Create a new notifier with the given public-reply decay period
    pub fn new(client: Arc<DiscordClient>, decay: Duration) -> Self {
        Self { client, decay }
    }

    /// Deliver a message to a user
    ///
    /// Returns the sent message on success. The fallback is attempted at
    /// most once; scheduling the decay deletion never blocks the caller.
    pub async fn notify(
        &self,
        user: Id<UserMarker>,
        body: &str,
        fallback: Option<Id<ChannelMarker>>,
    ) -> Result<Message, DiscordClientError> {
        let content = mention_body(user, body);

        let private_err = match self.send_private(user, &content).await {
            Ok(message) => return Ok(message),
            Err(e) => e,
        };

        let Some(channel) = fallback else {
            return Err(private_err);
        };

        debug!(
            "Direct message to {} failed ({}), falling back to public channel {}",
            user, private_err, channel
        );

        let message = self.client.send_message(channel, &content).await?;
        self.schedule_cleanup(message.channel_id, message.id);
        Ok(message)
    }

    async fn send_private(
        &self,
        user: Id<UserMarker>,
        content: &str,
    ) -> Result<Message, DiscordClientError> {
        let dm_channel = self.client.open_private_channel(user).await?;
        self.client.send_message(dm_channel, content).await
    }

    /// Delete the public copy after the decay period, detached from the
    /// delivery result
    fn schedule_cleanup(&self, channel: Id<ChannelMarker>, message: Id<MessageMarker>) {
        let client = Arc::clone(&self.client);
        let decay = self.decay;
        tokio::spawn(async move {
            tokio::time::sleep(decay).await;
            if let Err(e) = client.delete_message(channel, message).await {
                warn!(
                    "Failed to automatically delete public reply {}: {}. \
                     Message may have already been deleted manually.",
                    message, e
                );
            }
        });
    }
}

/// Prefix a notification body with the recipient's mention
fn mention_body(user: Id<UserMarker>, body: &str) -> String {
    format!("<@{}>\n{}", user, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_body() {
        let body = mention_body(Id::new(42), "your message was removed");
        assert_eq!(body, "<@42>\nyour message was removed");
    }
}
