//! Core types for the Newsdesk bot
//!
//! This crate defines the configuration surface shared between the bot
//! service and the administrative API server.

pub mod config;

pub use config::{ApiConfig, BotConfig, ConfigError, StatsConfig};
