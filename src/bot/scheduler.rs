//! Daily question job.
//!
//! A single tokio task sleeps until the next cron occurrence and then posts the
//! next question into every registered channel. A failure in one channel is
//! logged and does not stop the others.

use crate::{
    bot::posting::{self, ChannelLocks},
    config::app::parse_schedule,
    db::SqliteDatabase,
    errors::{Error, Result},
    store::channels,
};
use chrono::{DateTime, Local, TimeZone};
use croner::Cron;
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, instrument, warn};

/// Next fire time strictly after `now`, and how long to wait for it.
pub fn time_until_next<Tz: TimeZone>(
    cron: &Cron,
    now: &DateTime<Tz>,
) -> Result<(DateTime<Tz>, Duration)> {
    let next = cron
        .find_next_occurrence(now, false)
        .map_err(|e| Error::Schedule(format!("no upcoming occurrence: {e}")))?;
    let wait = (next.clone() - now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO);
    Ok((next, wait))
}

/// Runs forever, posting at every occurrence of `schedule`.
pub async fn run_daily_questions(
    http: Arc<serenity::Http>,
    db: Arc<SqliteDatabase>,
    locks: Arc<ChannelLocks>,
    schedule: String,
) {
    let cron = match parse_schedule(&schedule) {
        Ok(cron) => cron,
        Err(e) => {
            error!("Daily question job not started: {}", e);
            return;
        }
    };

    loop {
        let (next, wait) = match time_until_next(&cron, &Local::now()) {
            Ok(next) => next,
            Err(e) => {
                error!("Daily question job stopped: {}", e);
                return;
            }
        };
        info!("Next daily question post at {}", next);
        tokio::time::sleep(wait).await;

        let posted = post_to_all_channels(&http, &db, &locks).await;
        info!("Daily questions posted to {} channel(s).", posted);
    }
}

/// Posts the next question in every registered channel; returns how many got one.
#[instrument(skip(http, db, locks))]
pub async fn post_to_all_channels(
    http: &serenity::Http,
    db: &SqliteDatabase,
    locks: &ChannelLocks,
) -> usize {
    let all = match channels::get_all_channels(db) {
        Ok(all) => all,
        Err(e) => {
            error!("Failed to load channels: {}", e);
            return 0;
        }
    };

    let mut posted = 0;
    for channel in all {
        match posting::post_next_question(http, db, locks, &channel.channel_id).await {
            Ok(Some(_)) => posted += 1,
            Ok(None) => warn!("No question left for channel {}", channel.channel_id),
            Err(e) => error!("Failed to post to channel {}: {}", channel.channel_id, e),
        }
    }
    posted
}
