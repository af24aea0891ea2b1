//! Guild statistics displayed as locked voice channel names
//!
//! Statistics such as the total member count and per-role member counts are
//! rendered as the names of locked voice channels under a managed category.
//! A periodic reconciliation pass keeps the ordered list of desired labels
//! in 1:1 correspondence with the voice channels under the category, sorted
//! by position: existing channels are renamed in place, missing ones are
//! created, surplus ones are never touched.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};
use twilight_model::channel::{Channel, ChannelType};
use twilight_model::guild::{Member, Role};
use twilight_model::id::marker::{ChannelMarker, GuildMarker};
use twilight_model::id::Id;

use newsdesk_core::StatsConfig;

use crate::client::{DiscordClient, DiscordClientError};

/// Membership counts a reconciliation pass displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterCounts {
    /// Number of human (non-bot) members
    pub humans: usize,
    /// Member count per tracked role, in configured order
    pub role_counts: Vec<(String, usize)>,
}

impl RosterCounts {
    /// Tally a member/role snapshot against the tracked role names
    ///
    /// Tracked names are matched case-insensitively; the counts keep the
    /// configured order so stat ordinals stay stable across ticks.
    pub fn tally(members: &[Member], roles: &[Role], tracked: &[String]) -> Self {
        let humans = members.iter().filter(|m| !m.user.bot).count();

        let role_counts = tracked
            .iter()
            .filter_map(|name| {
                let role = roles.iter().find(|r| r.name.to_lowercase() == *name)?;
                let count = members.iter().filter(|m| m.roles.contains(&role.id)).count();
                Some((role.name.clone(), count))
            })
            .collect();

        Self {
            humans,
            role_counts,
        }
    }
}

/// Compute the ordered list of stat labels for one reconciliation pass
pub fn desired_labels(counts: &RosterCounts) -> Vec<String> {
    let mut labels = Vec::with_capacity(counts.role_counts.len() + 1);
    labels.push(format!("Discord Members: {}", format_count(counts.humans)));
    for (name, count) in &counts.role_counts {
        labels.push(format!("{}: {}", name, format_count(*count)));
    }
    labels
}

/// Format a count with thousands separators
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One remote write of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatAction {
    /// Rename the existing display channel at this ordinal
    Rename {
        channel: Id<ChannelMarker>,
        label: String,
    },
    /// Create a new display channel for this ordinal
    Create { label: String },
}

/// Zip desired labels against existing display channels by ordinal
///
/// `existing` must already be sorted by position ascending; that ordering is
/// the sole identity bridge between labels and channels. Surplus existing
/// channels get no action at all.
pub fn plan_updates(labels: &[String], existing: &[Id<ChannelMarker>]) -> Vec<StatAction> {
    labels
        .iter()
        .enumerate()
        .map(|(ordinal, label)| match existing.get(ordinal) {
            Some(&channel) => StatAction::Rename {
                channel,
                label: label.clone(),
            },
            None => StatAction::Create {
                label: label.clone(),
            },
        })
        .collect()
}

/// Periodic reconciler keeping one guild's stat channels current
pub struct StatsReconciler {
    client: Arc<DiscordClient>,
    config: StatsConfig,
}

impl StatsReconciler {
    /// Create a new reconciler
    pub fn new(client: Arc<DiscordClient>, config: StatsConfig) -> Self {
        Self { client, config }
    }

    /// Reconcile on the configured interval, forever
    ///
    /// The first pass runs immediately, so a freshly joined guild gets its
    /// stat channels before the steady interval kicks in. A failed pass is
    /// logged and retried on the next tick.
    pub async fn run(&self, guild_id: Id<GuildMarker>) {
        let mut interval = tokio::time::interval(self.config.update_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.run_once(guild_id).await {
                warn!("Stats reconciliation failed for guild {}: {}", guild_id, e);
            }
        }
    }

    /// Run a single reconciliation pass
    ///
    /// Reads a full member/role/channel snapshot before issuing any write.
    /// A listing failure aborts the whole pass; individual rename/create
    /// failures are logged and do not abort the others.
    pub async fn run_once(&self, guild_id: Id<GuildMarker>) -> Result<(), DiscordClientError> {
        let members = self.client.guild_members(guild_id).await?;
        let roles = self.client.guild_roles(guild_id).await?;
        let channels = self.client.guild_channels(guild_id).await?;

        let category = match find_category(&channels, &self.config.category_name) {
            Some(category) => category.id,
            None => {
                info!(
                    "Creating stats category '{}' on guild {}",
                    self.config.category_name, guild_id
                );
                self.client
                    .create_locked_category(guild_id, &self.config.category_name)
                    .await?
                    .id
            }
        };

        let existing = sorted_stat_channels(&channels, category);
        let counts = RosterCounts::tally(&members, &roles, &self.config.count_roles);
        let actions = plan_updates(&desired_labels(&counts), &existing);

        let applies = actions.into_iter().map(|action| {
            let client = Arc::clone(&self.client);
            async move {
                match action {
                    StatAction::Rename { channel, label } => client
                        .rename_channel(channel, &label)
                        .await
                        .map_err(|e| (label, e)),
                    StatAction::Create { label } => client
                        .create_locked_voice_channel(guild_id, category, &label)
                        .await
                        .map(|_| ())
                        .map_err(|e| (label, e)),
                }
            }
        });

        for result in join_all(applies).await {
            if let Err((label, e)) = result {
                warn!("Failed to update stat channel '{}': {}", label, e);
            }
        }

        Ok(())
    }
}

/// Find the managed category by case-insensitive name
///
/// The first match in listing order wins; duplicates left behind by a
/// concurrent creation race are never merged or deleted here.
fn find_category<'a>(channels: &'a [Channel], name: &str) -> Option<&'a Channel> {
    let wanted = name.to_lowercase();
    channels.iter().find(|c| {
        c.kind == ChannelType::GuildCategory
            && c.name
                .as_deref()
                .is_some_and(|n| n.to_lowercase() == wanted)
    })
}

/// Voice channels under the category, sorted by position ascending
fn sorted_stat_channels(channels: &[Channel], category: Id<ChannelMarker>) -> Vec<Id<ChannelMarker>> {
    let mut displays: Vec<_> = channels
        .iter()
        .filter(|c| c.kind == ChannelType::GuildVoice && c.parent_id == Some(category))
        .map(|c| (c.position.unwrap_or(i32::MAX), c.id))
        .collect();
    displays.sort();
    displays.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn ids(values: &[u64]) -> Vec<Id<ChannelMarker>> {
        values.iter().map(|&v| Id::new(v)).collect()
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(12_345), "12,345");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_desired_labels_order() {
        let counts = RosterCounts {
            humans: 1_500,
            role_counts: vec![("Contributor".to_string(), 42), ("VIP".to_string(), 3)],
        };

        let labels = desired_labels(&counts);
        assert_eq!(
            labels,
            vec!["Discord Members: 1,500", "Contributor: 42", "VIP: 3"]
        );
    }

    #[test]
    fn test_plan_renames_when_channels_exist() {
        let plan = plan_updates(&labels(&["a", "b"]), &ids(&[10, 11]));
        assert_eq!(
            plan,
            vec![
                StatAction::Rename {
                    channel: Id::new(10),
                    label: "a".to_string()
                },
                StatAction::Rename {
                    channel: Id::new(11),
                    label: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_plan_creates_missing_channels() {
        let plan = plan_updates(&labels(&["a", "b", "c"]), &ids(&[10]));
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan[0],
            StatAction::Rename {
                channel: Id::new(10),
                label: "a".to_string()
            }
        );
        assert_eq!(
            plan[1],
            StatAction::Create {
                label: "b".to_string()
            }
        );
        assert_eq!(
            plan[2],
            StatAction::Create {
                label: "c".to_string()
            }
        );
    }

    #[test]
    fn test_plan_leaves_surplus_channels_untouched() {
        // Five existing displays, two desired stats: the plan never shrinks
        // the channel list, it only renames the first two
        let plan = plan_updates(&labels(&["a", "b"]), &ids(&[10, 11, 12, 13, 14]));
        assert_eq!(plan.len(), 2);
        assert!(plan
            .iter()
            .all(|action| matches!(action, StatAction::Rename { .. })));
    }

    #[test]
    fn test_plan_is_deterministic() {
        // Two passes over unchanged inputs produce the same writes, so a
        // second reconciliation is a no-op in effect
        let desired = labels(&["a", "b"]);
        let existing = ids(&[10, 11]);
        assert_eq!(
            plan_updates(&desired, &existing),
            plan_updates(&desired, &existing)
        );
    }

    #[test]
    fn test_plan_empty_desired_list() {
        assert!(plan_updates(&[], &ids(&[10, 11])).is_empty());
    }
}
