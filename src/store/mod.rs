//! Question bot records persisted through the [`SqliteDatabase`] façade.
//!
//! Channels, questions, asked-question history and per-user submission counters
//! each live in their own table. Every function here is synchronous and returns
//! a `Result`; the bot calls them directly from its handlers.

pub mod channels;
pub mod questions;
pub mod users;

use crate::db::{Row, SchemaDescriptor, SqliteDatabase, TableDef};
use crate::errors::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::instrument;

pub(crate) const CHANNELS: &str = "channels";
pub(crate) const QUESTIONS: &str = "questions";
pub(crate) const ASKED: &str = "asked";
pub(crate) const USERS: &str = "users";

/// Tables backing the bot.
#[must_use]
pub fn schema() -> SchemaDescriptor {
    vec![
        TableDef::new(CHANNELS)
            .column("channel_id", "TEXT PRIMARY KEY")
            .column("guild_id", "TEXT")
            .column("question_id", "INTEGER")
            .column("message_id", "TEXT")
            .column("is_shallow", "INTEGER NOT NULL DEFAULT 0")
            .column("last_posted", "TEXT"),
        TableDef::new(QUESTIONS)
            .column("id", "INTEGER PRIMARY KEY AUTOINCREMENT")
            .column("text", "TEXT NOT NULL")
            .column("is_shallow", "INTEGER NOT NULL DEFAULT 0")
            .column("submitted_by", "TEXT")
            .column("created_at", "TEXT"),
        TableDef::new(ASKED)
            .column("channel_id", "TEXT NOT NULL")
            .column("question_id", "INTEGER NOT NULL")
            .column("asked_at", "TEXT"),
        TableDef::new(USERS)
            .column("user_id", "TEXT PRIMARY KEY")
            .column("submitted", "INTEGER NOT NULL DEFAULT 0")
            .column("last_submitted", "TEXT"),
    ]
}

/// Creates every bot table that does not exist yet.
#[instrument(skip(db))]
pub fn init(db: &SqliteDatabase) -> Result<()> {
    db.init_tables(&schema())
}

/// Turns a `json!({...})` literal into a row. Non-objects yield an empty row.
pub(crate) fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

pub(crate) fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

// Booleans come back from SQLite as 0/1.
pub(crate) fn bool_from_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(i64::deserialize(deserializer)? != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_tracing;

    #[test]
    fn test_init_creates_all_tables() -> Result<()> {
        init_test_tracing();
        let db = SqliteDatabase::open_in_memory()?;
        init(&db)?;
        // Running twice is harmless.
        init(&db)?;

        for table in [CHANNELS, QUESTIONS, ASKED, USERS] {
            assert!(db.find(table, &Row::new())?.is_empty());
        }
        Ok(())
    }
}
