//! Discord service for the Newsdesk bot
//!
//! This crate contains the moderation pipeline for the links-only news
//! channel, the guaranteed-delivery notification protocol, the guild
//! statistics reconciler and the gateway service tying them together.

pub mod client;
pub mod moderation;
pub mod notify;
pub mod service;
pub mod stats;

pub use client::{DiscordClient, DiscordClientError};
pub use moderation::ModerationPipeline;
pub use notify::Notifier;
pub use service::NewsdeskBot;
pub use stats::StatsReconciler;
