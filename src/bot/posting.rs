//! Sending questions to Discord and re-tallying their reactions.

use crate::{
    core::{
        rotation,
        votes::{self, ReactionCount, VoteDecision, VoteTally},
    },
    db::SqliteDatabase,
    errors::{Error, Result},
    store::{channels, questions::Question},
};
use poise::serenity_prelude as serenity;
use std::{
    collections::HashMap,
    future::Future,
    num::NonZeroU64,
    sync::{Arc, Mutex},
};
use tracing::{debug, info, instrument, warn};

/// One async lock per channel. Whoever advances a channel's question holds it
/// from the "is this still the current message" check until the new post is
/// recorded.
#[derive(Debug, Default)]
pub struct ChannelLocks {
    channels: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChannelLocks {
    /// The lock for `channel_id`, created on first use.
    pub fn channel(&self, channel_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(channels.entry(channel_id.to_string()).or_default())
    }
}

/// Parses a stored snowflake back into a Discord id.
pub fn parse_snowflake(id: &str) -> Result<NonZeroU64> {
    id.parse::<NonZeroU64>()
        .map_err(|e| Error::Database(format!("Stored id '{id}' is not a Discord snowflake: {e}")))
}

/// Text of a posted question.
#[must_use]
pub fn format_question(question: &Question) -> String {
    format!(
        "**Question of the day** ({})\n{}",
        channels::pool_name(question.is_shallow),
        question.text
    )
}

/// Posts the channel's next question, adds the voting reactions and records it
/// as the channel's current question. Returns `None` if the pool is exhausted.
#[instrument(skip(http, db, locks))]
pub async fn post_next_question(
    http: &serenity::Http,
    db: &SqliteDatabase,
    locks: &ChannelLocks,
    channel_id: &str,
) -> Result<Option<Question>> {
    let lock = locks.channel(channel_id);
    let _guard = lock.lock().await;
    post_locked(http, db, channel_id).await
}

async fn post_locked(
    http: &serenity::Http,
    db: &SqliteDatabase,
    channel_id: &str,
) -> Result<Option<Question>> {
    let Some(question) = rotation::next_question(db, channel_id)? else {
        return Ok(None);
    };

    let channel = serenity::ChannelId::from(parse_snowflake(channel_id)?);
    let message = channel
        .send_message(
            http,
            serenity::CreateMessage::new().content(format_question(&question)),
        )
        .await?;

    let posted = &message;
    record_then_react(
        db,
        channel_id,
        question.id,
        &message.id.to_string(),
        move |emoji| async move { posted.react(http, emoji).await.map(drop).map_err(Error::from) },
    )
    .await?;
    info!(
        "Posted question {} to channel {} (message {})",
        question.id, channel_id, message.id
    );
    Ok(Some(question))
}

/// Records a sent message as the channel's current question, then adds the
/// voting reactions with `react`. A reaction that fails is logged and skipped;
/// the post stays recorded either way.
pub async fn record_then_react<F, Fut>(
    db: &SqliteDatabase,
    channel_id: &str,
    question_id: i64,
    message_id: &str,
    mut react: F,
) -> Result<()>
where
    F: FnMut(char) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    rotation::mark_posted(db, channel_id, question_id, message_id)?;
    for emoji in [votes::UPVOTE, votes::DOWNVOTE] {
        if let Err(e) = react(emoji).await {
            warn!(
                "Could not add {} to message {} in channel {}: {}",
                emoji, message_id, channel_id, e
            );
        }
    }
    Ok(())
}

/// Runs `advance` under the channel's lock, but only if `message_id` is still
/// the channel's current question once the lock is held. Returns `None` when
/// another task already moved the channel on.
pub async fn advance_if_current<F, Fut, T>(
    locks: &ChannelLocks,
    db: &SqliteDatabase,
    channel_id: &str,
    message_id: &str,
    advance: F,
) -> Result<Option<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let lock = locks.channel(channel_id);
    let _guard = lock.lock().await;
    if !rotation::is_current_question_message(db, channel_id, message_id)? {
        debug!(
            "Message {} is no longer current in channel {}",
            message_id, channel_id
        );
        return Ok(None);
    }
    advance().await.map(Some)
}

/// Converts Discord's reaction groups into a tally. Custom emoji are ignored.
#[must_use]
pub fn tally_message(message: &serenity::Message) -> VoteTally {
    let counts: Vec<ReactionCount<'_>> = message
        .reactions
        .iter()
        .filter_map(|r| match &r.reaction_type {
            serenity::ReactionType::Unicode(emoji) => Some(ReactionCount {
                emoji,
                count: r.count,
                me: r.me,
            }),
            _ => None,
        })
        .collect();
    VoteTally::from_reactions(&counts)
}

/// Re-tallies the current question in a channel and skips it if it was voted
/// down. Reactions on any other message are ignored.
#[instrument(skip(http, db, locks))]
pub async fn handle_vote(
    http: &serenity::Http,
    db: &SqliteDatabase,
    locks: &ChannelLocks,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    skip_margin: u64,
) -> Result<VoteDecision> {
    let channel_key = channel_id.to_string();
    let message_key = message_id.to_string();
    if !rotation::is_current_question_message(db, &channel_key, &message_key)? {
        return Ok(VoteDecision::Keep);
    }

    let message = channel_id.message(http, message_id).await?;
    let tally = tally_message(&message);
    let decision = tally.decide(skip_margin);
    debug!(
        "Votes on {} in {}: +{} -{} -> {:?}",
        message_id, channel_id, tally.up, tally.down, decision
    );

    if decision == VoteDecision::Skip {
        let skipped = advance_if_current(locks, db, &channel_key, &message_key, || {
            post_locked(http, db, &channel_key)
        })
        .await?;
        if skipped.is_some() {
            info!("Question in channel {} was voted down, skipping.", channel_id);
        }
    }
    Ok(decision)
}
