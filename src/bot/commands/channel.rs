//! Channel Discord commands - subscribing, switching pools and skipping.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, posting},
        errors::{Error, Result},
        store::channels,
    };

    /// Registers this channel to receive the daily question.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn subscribe(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let channel_id = ctx.channel_id().to_string();
        let guild_id = ctx.guild_id().map(|g| g.to_string());

        let existing = channels::get_channel_info(db, &channel_id)?;
        let channel = channels::register_channel(db, &channel_id, guild_id.as_deref())?;

        if existing.is_some() {
            ctx.say("ℹ️ This channel already receives the daily question.")
                .await?;
        } else {
            ctx.say(format!(
                "✅ Subscribed! This channel will get a {} question every day.",
                channels::pool_name(channel.is_shallow)
            ))
            .await?;
        }
        Ok(())
    }

    /// Switches this channel between shallow and deep questions.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn shallow(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let channel_id = ctx.channel_id().to_string();

        if channels::get_channel_info(db, &channel_id)?.is_none() {
            ctx.say("❌ This channel is not subscribed. Use `/subscribe` first.")
                .await?;
            return Ok(());
        }

        let is_shallow = channels::flip_shallow(db, &channel_id)?;
        ctx.say(format!(
            "✅ This channel now gets {} questions.",
            channels::pool_name(is_shallow)
        ))
        .await?;
        Ok(())
    }

    /// Posts the next question in this channel right away.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn skip(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let channel_id = ctx.channel_id().to_string();

        if channels::get_channel_info(db, &channel_id)?.is_none() {
            ctx.say("❌ This channel is not subscribed. Use `/subscribe` first.")
                .await?;
            return Ok(());
        }

        let posted =
            posting::post_next_question(ctx.http(), db, &ctx.data().locks, &channel_id).await?;
        match posted {
            Some(question) => {
                ctx.say(format!("⏭️ Skipped ahead to question #{}.", question.id))
                    .await?;
            }
            None => {
                ctx.say("📭 No questions left in this channel's pool. DM me some new ones!")
                    .await?;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
