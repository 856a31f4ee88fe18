//! Per-channel question rotation.
//!
//! Posting is split in two so a failed Discord send never burns a question:
//! [`next_question`] only reads, [`mark_posted`] records the result afterwards.

use crate::{
    db::SqliteDatabase,
    errors::Result,
    store::{
        channels,
        questions::{self, Question},
    },
};
use tracing::{info, instrument, warn};

/// The question a channel should see next, or `None` once its pool is used up.
#[instrument(skip(db))]
pub fn next_question(db: &SqliteDatabase, channel_id: &str) -> Result<Option<Question>> {
    let next = questions::get_next_question(db, channel_id)?;
    if next.is_none() {
        let pool = channels::pool_name(channels::get_is_shallow(db, channel_id)?);
        warn!("Channel {} has run out of {} questions", channel_id, pool);
    }
    Ok(next)
}

/// Records that `question_id` went out in `message_id`: the question joins the
/// channel's asked history and becomes the channel's current question.
#[instrument(skip(db))]
pub fn mark_posted(
    db: &SqliteDatabase,
    channel_id: &str,
    question_id: i64,
    message_id: &str,
) -> Result<()> {
    questions::set_asked(db, channel_id, question_id)?;
    channels::set_question_message_id(db, channel_id, question_id, message_id)?;
    info!("Channel {} advanced to question {}", channel_id, question_id);
    Ok(())
}

/// Whether `message_id` is the question currently posted in the channel.
#[instrument(skip(db))]
pub fn is_current_question_message(
    db: &SqliteDatabase,
    channel_id: &str,
    message_id: &str,
) -> Result<bool> {
    Ok(channels::get_channel_info(db, channel_id)?
        .and_then(|c| c.message_id)
        .is_some_and(|current| current == message_id))
}
