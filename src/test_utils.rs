//! Shared test utilities.
//!
//! Helpers for setting up in-memory databases with the bot schema and for
//! seeding channels and questions with sensible defaults.

use crate::{
    db::SqliteDatabase,
    errors::Result,
    store::{self, channels::ChannelInfo},
};
use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};
use tracing_subscriber::EnvFilter;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut out) = self.0.lock() {
            out.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber at `info` and returns what it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let text = logs
        .0
        .lock()
        .map(|out| String::from_utf8_lossy(&out).into_owned())
        .unwrap_or_default();
    (result, text)
}

/// Creates an in-memory database with every bot table initialized.
pub fn setup_test_db() -> Result<SqliteDatabase> {
    init_test_tracing();
    let db = SqliteDatabase::open_in_memory()?;
    store::init(&db)?;
    Ok(db)
}

/// Registers a channel with default settings (shallow pool off).
pub fn create_test_channel(db: &SqliteDatabase, channel_id: &str) -> Result<ChannelInfo> {
    store::channels::register_channel(db, channel_id, Some("test_guild"))
}

/// Adds a batch of questions to one pool, returning their ids in order.
pub fn create_test_questions(
    db: &SqliteDatabase,
    texts: &[&str],
    is_shallow: bool,
) -> Result<Vec<i64>> {
    texts
        .iter()
        .map(|text| store::questions::add_question(db, text, is_shallow, Some("test_user")))
        .collect()
}

/// Sets up a database with one registered channel and three deep questions.
pub fn setup_with_channel() -> Result<(SqliteDatabase, ChannelInfo, Vec<i64>)> {
    let db = setup_test_db()?;
    let channel = create_test_channel(&db, "100")?;
    let ids = create_test_questions(
        &db,
        &["First question?", "Second question?", "Third question?"],
        false,
    )?;
    Ok((db, channel, ids))
}
