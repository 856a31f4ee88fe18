//! Database setup for the bot.
//!
//! Opens the `SQLite` file named in the configuration, creates the bot tables,
//! seeds the question bank and registers the configured channels.

use crate::{
    config::app::AppConfig,
    db::SqliteDatabase,
    errors::{Error, Result},
    store::{self, channels, questions},
};
use std::path::Path;
use tracing::{info, instrument};

/// Opens the configured database and makes sure it is ready for the bot.
#[instrument(skip(config), fields(path = %config.database_path))]
pub fn init_database(config: &AppConfig) -> Result<SqliteDatabase> {
    ensure_parent_dir(&config.database_path)?;
    let db = SqliteDatabase::open_with_schema(&config.database_path, &store::schema())?;
    prepare(&db, config)?;
    Ok(db)
}

/// Seeds questions and registers channels on an already-open database.
pub fn prepare(db: &SqliteDatabase, config: &AppConfig) -> Result<()> {
    let seeded = questions::seed_questions(db, &config.questions)?;
    if seeded > 0 {
        info!("Seeded {} questions from configuration.", seeded);
    }
    for channel_id in &config.channels {
        channels::register_channel(db, &channel_id.to_string(), None)?;
    }
    Ok(())
}

fn ensure_parent_dir(database_path: &str) -> Result<()> {
    match Path::new(database_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Database(format!("Failed to create directory {parent:?}: {e}"))
            })
        }
        _ => Ok(()),
    }
}
