//! Links-only moderation of the news channel
//!
//! The news channel can only contain links to news stories. A message with
//! a working article link gets a discussion thread named after the article;
//! anything else is removed and the author is told why through the
//! notification protocol.

use std::sync::Arc;

use tracing::{error, info};
use twilight_model::channel::Message;

use newsdesk_extract::{first_url, ArticleFetcher};

use crate::client::DiscordClient;
use crate::notify::Notifier;

/// Discord caps thread names at 100 characters
const MAX_THREAD_TITLE_LENGTH: usize = 100;

const REMOVAL_EXPLANATION: &str = "Please only post news articles. Discussion on news \
    stories should take place inside their designated thread which will be created \
    automatically.";

/// Enforces the links-only policy on the monitored channel
pub struct ModerationPipeline {
    client: Arc<DiscordClient>,
    fetcher: ArticleFetcher,
    notifier: Notifier,
}

impl ModerationPipeline {
    /// Create a new moderation pipeline
    pub fn new(client: Arc<DiscordClient>, fetcher: ArticleFetcher, notifier: Notifier) -> Self {
        Self {
            client,
            fetcher,
            notifier,
        }
    }

    /// Process one inbound message from the monitored channel
    pub async fn handle_message(&self, message: &Message) {
        let Some(url) = first_url(&message.content) else {
            self.reject(message).await;
            return;
        };

        match self.fetcher.fetch_title(url).await {
            Ok(title) => {
                // A reachable page without a usable title still counts as an
                // article; the bare URL becomes the thread label
                let title = title.unwrap_or_else(|| url.to_string());
                self.accept(message, &title).await;
            }
            Err(e) => {
                info!("Could not resolve a title for {}: {}", url, e);
                self.reject(message).await;
            }
        }
    }

    async fn accept(&self, message: &Message, title: &str) {
        let name = thread_title(title);
        info!(
            "Creating news discussion thread for {} named '{}'",
            message.author.name, name
        );

        if let Err(e) = self
            .client
            .create_thread(message.channel_id, message.id, &name)
            .await
        {
            error!(
                "Failed to create discussion thread on message {}: {}",
                message.id, e
            );
        }
    }

    async fn reject(&self, message: &Message) {
        info!(
            "Removing message '{}' by {}",
            message.content, message.author.name
        );

        // The delete must succeed before the author is notified, so a
        // redelivered event cannot be double-processed
        if let Err(e) = self
            .client
            .delete_message(message.channel_id, message.id)
            .await
        {
            error!("Failed to remove message {}: {}", message.id, e);
            return;
        }

        let notice = removal_notice(&message.content, REMOVAL_EXPLANATION);
        if let Err(e) = self
            .notifier
            .notify(message.author.id, &notice, Some(message.channel_id))
            .await
        {
            error!(
                "Failed to notify {} about their removed message: {}",
                message.author.name, e
            );
        }
    }
}

/// Turn an article title into a valid thread name
///
/// Truncates to the thread name limit and substitutes characters Discord
/// treats specially in channel names with visually similar ones.
pub fn thread_title(title: &str) -> String {
    title
        .chars()
        .take(MAX_THREAD_TITLE_LENGTH)
        .map(|c| match c {
            '/' => '\u{2044}',
            ':' => '\u{02d0}',
            c => c,
        })
        .collect()
}

/// Build the removal notice sent to the author
///
/// The removed content is quoted back, with every line carrying the quote
/// prefix so the block quote survives multi-line messages.
fn removal_notice(content: &str, explanation: &str) -> String {
    format!(
        "> {}\n**This message was removed.** {}",
        escape_markdown(content).replace('\n', "\n> "),
        explanation
    )
}

/// Escape markdown formatting characters in quoted user content
fn escape_markdown(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '~' | '|') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_title_truncates_to_limit() {
        let long_title = "a".repeat(250);
        let name = thread_title(&long_title);
        assert_eq!(name.chars().count(), 100);
    }

    #[test]
    fn test_thread_title_short_unchanged() {
        assert_eq!(thread_title("Example Headline"), "Example Headline");
    }

    #[test]
    fn test_thread_title_substitutes_unsafe_characters() {
        assert_eq!(
            thread_title("Breaking: cats/dogs at peace"),
            "Breaking\u{02d0} cats\u{2044}dogs at peace"
        );
    }

    #[test]
    fn test_removal_notice_quotes_content() {
        let notice = removal_notice("no link here", "Reason.");
        assert_eq!(
            notice,
            "> no link here\n**This message was removed.** Reason."
        );
    }

    #[test]
    fn test_removal_notice_quotes_every_line() {
        let notice = removal_notice("first\nsecond\nthird", "Reason.");
        assert!(notice.starts_with("> first\n> second\n> third\n"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("*bold* _it_"), "\\*bold\\* \\_it\\_");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }
}
