//! Bot configuration
//!
//! All options are read from environment variables (see the README for the
//! full list). Only `DISCORD_TOKEN` is required; everything else has a
//! default suitable for a small community server.

use std::env;
use std::time::Duration;

/// Top-level configuration for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Discord bot token for authentication
    pub token: String,
    /// Name of the moderated links-only channel
    pub news_channel: String,
    /// How long a public fallback reply stays up before deletion
    pub reply_decay: Duration,
    /// Statistics dashboard settings
    pub stats: StatsConfig,
    /// Administrative API server settings
    pub api: ApiConfig,
}

/// Configuration for the guild statistics dashboard
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Whether stat channels are maintained at all
    pub enabled: bool,
    /// Name of the category the stat channels live under
    pub category_name: String,
    /// Time between reconciliation passes
    pub update_interval: Duration,
    /// Role names (lowercased) whose member counts are displayed
    pub count_roles: Vec<String>,
}

/// Configuration for the administrative API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Whether the API server is started
    pub enabled: bool,
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Optional bearer token required on every request
    pub token: Option<String>,
}

impl BotConfig {
    /// Load configuration from environment variables
    ///
    /// Fails only when `DISCORD_TOKEN` is missing or blank; all other
    /// options fall back to their defaults when unset or unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = env::var("DISCORD_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            token,
            news_channel: var_or("NEWS_CHANNEL_NAME", "news"),
            reply_decay: parse_millis(env::var("PUBLIC_REPLY_DECAY_TIME").ok(), 120_000),
            stats: StatsConfig {
                enabled: parse_flag(env::var("STATS_ENABLED").ok(), true),
                category_name: var_or("STATS_CATEGORY_NAME", "stats"),
                update_interval: parse_millis(env::var("STATS_UPDATE_INTERVAL").ok(), 600_000),
                count_roles: parse_role_list(env::var("STATS_COUNT_ROLES").ok()),
            },
            api: ApiConfig {
                enabled: parse_flag(env::var("API_SERVER_ENABLED").ok(), true),
                host: var_or("API_SERVER_HOST", "0.0.0.0"),
                port: env::var("API_SERVER_PORT")
                    .ok()
                    .and_then(|p| p.trim().parse().ok())
                    .unwrap_or(8000),
                token: env::var("API_SERVER_TOKEN")
                    .ok()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a boolean flag, accepting `true`, `on`, `y` and `1` prefixes
fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => {
            let v = v.trim().to_lowercase();
            ["true", "on", "y", "1"].iter().any(|p| v.starts_with(p))
        }
        None => default,
    }
}

/// Parse a millisecond duration, falling back on missing or invalid input
fn parse_millis(value: Option<String>, default_ms: u64) -> Duration {
    let ms = value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// Parse a comma-separated role name list, trimmed and lowercased
fn parse_role_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Set required DISCORD_TOKEN environment variable.")]
    MissingToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_accepted_values() {
        for value in ["true", "on", "y", "1", "yes", "TRUE", " On "] {
            assert!(parse_flag(Some(value.to_string()), false), "{value}");
        }
    }

    #[test]
    fn test_parse_flag_rejected_values() {
        for value in ["false", "off", "no", "0", ""] {
            assert!(!parse_flag(Some(value.to_string()), true), "{value}");
        }
    }

    #[test]
    fn test_parse_flag_default_when_unset() {
        assert!(parse_flag(None, true));
        assert!(!parse_flag(None, false));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(
            parse_millis(Some("5000".to_string()), 120_000),
            Duration::from_secs(5)
        );
        // Invalid and zero values fall back to the default
        assert_eq!(
            parse_millis(Some("soon".to_string()), 120_000),
            Duration::from_millis(120_000)
        );
        assert_eq!(
            parse_millis(Some("0".to_string()), 120_000),
            Duration::from_millis(120_000)
        );
        assert_eq!(parse_millis(None, 600_000), Duration::from_millis(600_000));
    }

    #[test]
    fn test_parse_role_list() {
        let roles = parse_role_list(Some("Member, Contributor,,  VIP ".to_string()));
        assert_eq!(roles, vec!["member", "contributor", "vip"]);
    }

    #[test]
    fn test_parse_role_list_empty() {
        assert!(parse_role_list(None).is_empty());
        assert!(parse_role_list(Some("".to_string())).is_empty());
    }
}
