//! Gateway service
//!
//! Connects to the Discord Gateway, dispatches inbound events to the
//! moderation pipeline and maintains one statistics reconciliation task per
//! joined guild.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use twilight_cache_inmemory::{DefaultInMemoryCache, ResourceType};
use twilight_gateway::{Event, EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_model::channel::ChannelType;
use twilight_model::gateway::payload::incoming::MessageCreate;
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

use newsdesk_core::BotConfig;
use newsdesk_extract::ArticleFetcher;

use crate::client::DiscordClient;
use crate::moderation::ModerationPipeline;
use crate::notify::Notifier;
use crate::stats::StatsReconciler;

/// The Newsdesk bot service
pub struct NewsdeskBot {
    config: BotConfig,
    client: Arc<DiscordClient>,
    cache: DefaultInMemoryCache,
    moderation: Arc<ModerationPipeline>,
    stats: Arc<StatsReconciler>,
    /// One reconciliation task per joined guild, keyed by guild id
    stat_tasks: DashMap<u64, JoinHandle<()>>,
    /// First guild the bot joined; the administrative API serves this one
    primary_guild: RwLock<Option<Id<GuildMarker>>>,
}

impl NewsdeskBot {
    /// Create the bot service
    pub fn new(config: BotConfig, fetcher: ArticleFetcher) -> Self {
        let client = Arc::new(DiscordClient::new(config.token.clone()));

        // Channel lookups happen on every inbound message; serve them from
        // an in-memory cache fed by gateway events
        let cache = DefaultInMemoryCache::builder()
            .resource_types(ResourceType::CHANNEL | ResourceType::GUILD)
            .build();

        let notifier = Notifier::new(Arc::clone(&client), config.reply_decay);
        let moderation = Arc::new(ModerationPipeline::new(
            Arc::clone(&client),
            fetcher,
            notifier,
        ));
        let stats = Arc::new(StatsReconciler::new(Arc::clone(&client), config.stats.clone()));

        Self {
            config,
            client,
            cache,
            moderation,
            stats,
            stat_tasks: DashMap::new(),
            primary_guild: RwLock::new(None),
        }
    }

    /// Shared handle to the Discord client, used by the administrative API
    pub fn client(&self) -> Arc<DiscordClient> {
        Arc::clone(&self.client)
    }

    /// The guild the administrative API serves, once one has been joined
    pub async fn primary_guild(&self) -> Option<Id<GuildMarker>> {
        *self.primary_guild.read().await
    }

    /// Run the service indefinitely, reconnecting on gateway failure
    pub async fn start(self: Arc<Self>) {
        info!("Starting Newsdesk bot service");

        loop {
            match self.run_gateway_loop().await {
                Ok(()) => {
                    warn!("Discord Gateway closed, reconnecting in 5s...");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Err(e) => {
                    error!("Discord Gateway error: {}, reconnecting in 10s...", e);
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
            }
        }
    }

    /// Run the Discord Gateway event loop until the connection ends
    async fn run_gateway_loop(&self) -> Result<(), GatewayError> {
        info!("Connecting to Discord Gateway...");

        let intents = Intents::GUILDS
            | Intents::GUILD_MEMBERS
            | Intents::GUILD_MESSAGES
            | Intents::MESSAGE_CONTENT
            | Intents::DIRECT_MESSAGES;

        let mut shard = Shard::new(ShardId::ONE, self.config.token.clone(), intents);

        while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
            let event = match item {
                Ok(event) => event,
                Err(source) => {
                    error!("Error receiving gateway event: {}", source);
                    return Err(GatewayError::Gateway(source.to_string()));
                }
            };

            self.cache.update(&event);

            match event {
                Event::Ready(ready) => {
                    info!("Bot is now online as {}", ready.user.name);
                }
                Event::GuildCreate(guild) => {
                    self.handle_guild_create(guild.id()).await;
                }
                Event::GuildDelete(guild) => {
                    self.handle_guild_delete(guild.id).await;
                }
                Event::MessageCreate(message) => {
                    self.handle_message_create(message);
                }
                Event::GatewayClose(_) => {
                    warn!("Discord Gateway closed by server");
                    return Ok(());
                }
                _ => {}
            }
        }

        Ok(())
    }

    async fn handle_guild_create(&self, guild_id: Id<GuildMarker>) {
        {
            let mut primary = self.primary_guild.write().await;
            if primary.is_none() {
                info!("Serving guild {}", guild_id);
                *primary = Some(guild_id);
            }
        }

        self.ensure_stats_task(guild_id);
    }

    async fn handle_guild_delete(&self, guild_id: Id<GuildMarker>) {
        if let Some((_, task)) = self.stat_tasks.remove(&guild_id.get()) {
            info!("Left guild {}, stopping its statistics task", guild_id);
            task.abort();
        }

        let mut primary = self.primary_guild.write().await;
        if *primary == Some(guild_id) {
            *primary = None;
        }
    }

    /// Start the guild's reconciliation task if it is not already running
    fn ensure_stats_task(&self, guild_id: Id<GuildMarker>) {
        if !self.config.stats.enabled {
            return;
        }

        self.stat_tasks.entry(guild_id.get()).or_insert_with(|| {
            info!(
                "Setting up guild statistics (shown as locked voice channels) on guild {}",
                guild_id
            );
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                stats.run(guild_id).await;
            })
        });
    }

    fn handle_message_create(&self, message: Box<MessageCreate>) {
        // ignore own messages and other bots
        if message.author.bot {
            return;
        }

        // guild text channels only
        if message.guild_id.is_none() {
            return;
        }

        let is_news_channel = self
            .cache
            .channel(message.channel_id)
            .map(|channel| {
                channel.kind == ChannelType::GuildText
                    && channel.name.as_deref() == Some(self.config.news_channel.as_str())
            })
            .unwrap_or(false);

        if !is_news_channel {
            return;
        }

        // Each message is moderated independently; ordering between two
        // messages in the same channel is not guaranteed
        let moderation = Arc::clone(&self.moderation);
        tokio::spawn(async move {
            moderation.handle_message(&message.0).await;
        });
    }
}

/// Errors that can occur in the gateway service
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway error: {0}")]
    Gateway(String),
}
