//! Gateway event handling: reaction votes on posted questions and questions
//! submitted by direct message.

use crate::{
    bot::{BotData, posting},
    core::submission,
    errors::{Error, Result},
    store::{channels, questions, users},
};
use chrono::Local;
use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

/// Prefix for text commands; DMs starting with it are not treated as submissions.
pub const COMMAND_PREFIX: &str = "!";

/// Dispatches the gateway events the bot cares about.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            on_reaction(ctx, data, framework.bot_id, add_reaction).await?;
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            on_reaction(ctx, data, framework.bot_id, removed_reaction).await?;
        }
        serenity::FullEvent::Message { new_message } => {
            on_direct_message(ctx, data, new_message).await?;
        }
        _ => {}
    }
    Ok(())
}

async fn on_reaction(
    ctx: &serenity::Context,
    data: &BotData,
    bot_id: serenity::UserId,
    reaction: &serenity::Reaction,
) -> Result<()> {
    if reaction.user_id == Some(bot_id) || reaction.guild_id.is_none() {
        return Ok(());
    }
    posting::handle_vote(
        &ctx.http,
        &data.database,
        &data.locks,
        reaction.channel_id,
        reaction.message_id,
        data.config.skip_margin,
    )
    .await?;
    Ok(())
}

async fn on_direct_message(
    ctx: &serenity::Context,
    data: &BotData,
    message: &serenity::Message,
) -> Result<()> {
    if message.author.bot
        || message.guild_id.is_some()
        || message.content.trim_start().starts_with(COMMAND_PREFIX)
    {
        return Ok(());
    }

    let reply = intake_submission(data, &message.author.id.to_string(), &message.content)?;
    message.reply(ctx, reply).await?;
    Ok(())
}

/// Validates a DM, applies the daily limit and stores the question. Returns
/// the reply to send back; user mistakes become replies, storage failures errors.
pub fn intake_submission(data: &BotData, user_id: &str, content: &str) -> Result<String> {
    let db = &data.database;
    let config = &data.config;

    let parsed = match submission::parse_submission(content, config.max_question_length) {
        Ok(parsed) => parsed,
        Err(Error::InvalidSubmission { reason }) => {
            debug!("Rejected submission from {}: {}", user_id, reason);
            return Ok(format!("❌ I couldn't add that question: {reason}."));
        }
        Err(e) => return Err(e),
    };

    let today = Local::now().date_naive();
    match users::ensure_can_submit(db, user_id, today, config.daily_submission_limit) {
        Ok(()) => {}
        Err(Error::SubmissionLimit { limit }) => {
            warn!("User {} hit the daily submission limit", user_id);
            return Ok(format!(
                "⏳ You've already submitted {limit} questions today. Try again tomorrow!"
            ));
        }
        Err(e) => return Err(e),
    }

    // Only a stored question counts against the limit.
    let id = questions::add_question(db, &parsed.text, parsed.is_shallow, Some(user_id))?;
    users::record_submission(db, user_id, today, config.daily_submission_limit)?;
    info!("User {} submitted question {}", user_id, id);
    Ok(format!(
        "✅ Thanks! Added your {} question #{id}: {}",
        channels::pool_name(parsed.is_shallow),
        parsed.text
    ))
}
