//! Bot layer - Discord-specific interface, command handlers and the daily job
//!
//! This module wires the question store into Discord: slash commands, reaction
//! and DM event handling, posting, and the scheduled daily post.

/// Framework setup and client startup
pub mod client;
/// Discord command implementations (channel, general)
pub mod commands;
/// Gateway event handlers (reactions, direct messages)
pub mod handlers;
/// Posting questions and tallying their votes
pub mod posting;
/// Cron-driven daily posting
pub mod scheduler;

use crate::{bot::posting::ChannelLocks, config::AppConfig, db::SqliteDatabase};
use std::sync::Arc;

/// Shared data available to all bot commands and event handlers.
#[derive(Debug)]
pub struct BotData {
    /// The bot's database, shared with the scheduler task
    pub database: Arc<SqliteDatabase>,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Per-channel locks, shared with the scheduler task
    pub locks: Arc<ChannelLocks>,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database, configuration
    /// and channel locks.
    #[must_use]
    pub const fn new(
        database: Arc<SqliteDatabase>,
        config: Arc<AppConfig>,
        locks: Arc<ChannelLocks>,
    ) -> Self {
        Self {
            database,
            config,
            locks,
        }
    }
}

pub use client::run_bot;
pub use commands::*;
