//! Channel records: which channels receive questions, what was last posted
//! there, and which question pool they draw from.

use crate::{
    db::{Row, SqliteDatabase},
    errors::{Error, Result},
    store::{CHANNELS, bool_from_int, from_row, row},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

/// A channel registered to receive the daily question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Discord channel id
    pub channel_id: String,
    /// Guild the channel belongs to, if known
    pub guild_id: Option<String>,
    /// Question currently posted in the channel
    pub question_id: Option<i64>,
    /// Discord message carrying the current question
    pub message_id: Option<String>,
    /// Whether the channel draws from the shallow pool
    #[serde(deserialize_with = "bool_from_int")]
    pub is_shallow: bool,
    /// RFC 3339 timestamp of the last post
    pub last_posted: Option<String>,
}

fn by_id(channel_id: &str) -> Row {
    row(json!({ "channel_id": channel_id }))
}

/// Looks up a channel, returning `None` if it was never registered.
#[instrument(skip(db))]
pub fn get_channel_info(db: &SqliteDatabase, channel_id: &str) -> Result<Option<ChannelInfo>> {
    db.find_one(CHANNELS, &by_id(channel_id))?
        .map(from_row)
        .transpose()
}

fn require_channel(db: &SqliteDatabase, channel_id: &str) -> Result<ChannelInfo> {
    get_channel_info(db, channel_id)?.ok_or_else(|| Error::ChannelNotFound {
        channel_id: channel_id.to_string(),
    })
}

/// Registers a channel if it is not known yet and returns its record.
#[instrument(skip(db))]
pub fn register_channel(
    db: &SqliteDatabase,
    channel_id: &str,
    guild_id: Option<&str>,
) -> Result<ChannelInfo> {
    if let Some(existing) = get_channel_info(db, channel_id)? {
        debug!("Channel {} already registered.", channel_id);
        return Ok(existing);
    }

    db.insert(
        CHANNELS,
        &row(json!({
            "channel_id": channel_id,
            "guild_id": guild_id,
            "is_shallow": false,
        })),
    )?;
    info!("Registered channel {}", channel_id);
    require_channel(db, channel_id)
}

/// Every registered channel.
#[instrument(skip(db))]
pub fn get_all_channels(db: &SqliteDatabase) -> Result<Vec<ChannelInfo>> {
    db.find(CHANNELS, &Row::new())?
        .into_iter()
        .map(from_row)
        .collect()
}

/// Records which question was posted and the message carrying it.
#[instrument(skip(db))]
pub fn set_question_message_id(
    db: &SqliteDatabase,
    channel_id: &str,
    question_id: i64,
    message_id: &str,
) -> Result<()> {
    let info = db.update(
        CHANNELS,
        &row(json!({
            "question_id": question_id,
            "message_id": message_id,
            "last_posted": Utc::now().to_rfc3339(),
        })),
        &by_id(channel_id),
    )?;
    if info.changes == 0 {
        return Err(Error::ChannelNotFound {
            channel_id: channel_id.to_string(),
        });
    }
    Ok(())
}

/// Whether the channel currently draws from the shallow pool.
#[instrument(skip(db))]
pub fn get_is_shallow(db: &SqliteDatabase, channel_id: &str) -> Result<bool> {
    Ok(require_channel(db, channel_id)?.is_shallow)
}

/// Toggles the channel between the shallow and deep pools, returning the new mode.
#[instrument(skip(db))]
pub fn flip_shallow(db: &SqliteDatabase, channel_id: &str) -> Result<bool> {
    let flipped = !get_is_shallow(db, channel_id)?;
    db.update(
        CHANNELS,
        &row(json!({ "is_shallow": flipped })),
        &by_id(channel_id),
    )?;
    info!("Channel {} now uses the {} pool", channel_id, pool_name(flipped));
    Ok(flipped)
}

/// Human name of a question pool.
#[must_use]
pub const fn pool_name(is_shallow: bool) -> &'static str {
    if is_shallow { "shallow" } else { "deep" }
}
