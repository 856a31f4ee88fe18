//! General Discord commands - ping, help and release notes.
//! These commands don't require database operations.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::release_notes,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**QuestionBuddy Help**\n\
        A new question is posted every day in subscribed channels.\n\n\
        **Voting**\n\
        • React 👍 or 👎 on the question. Enough 👎 and it gets replaced right away.\n\n\
        **Submitting questions**\n\
        • DM me your question. Start it with `deep:` or `shallow:` to pick the pool.\n\n\
        **Channel Commands**\n\
        • `/subscribe` - Receive the daily question in this channel.\n\
        • `/shallow` - Switch this channel between shallow and deep questions.\n\
        • `/skip` - Post the next question now.\n\n\
        **Utility Commands**\n\
        • `/whatsnew` - Shows the latest release notes.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the latest release notes.
    #[poise::command(slash_command, prefix_command)]
    pub async fn whatsnew(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        match release_notes::latest_release(release_notes::README) {
            Some(notes) => {
                ctx.say(format!("**What's new in {}**\n{}", notes.version, notes.body))
                    .await?;
            }
            None => {
                ctx.say("No release notes available.").await?;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
