//! Question bank and per-channel asked history.

use crate::{
    db::{Row, SqliteDatabase, render_insert_literal},
    errors::Result,
    store::{ASKED, QUESTIONS, bool_from_int, channels, from_row, row},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// A question in the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Primary key
    pub id: i64,
    /// The question itself
    pub text: String,
    /// Which pool the question belongs to
    #[serde(deserialize_with = "bool_from_int")]
    pub is_shallow: bool,
    /// Discord user id of the submitter, `None` for seeded questions
    pub submitted_by: Option<String>,
    /// RFC 3339 timestamp of creation
    pub created_at: Option<String>,
}

/// A question listed in `config.toml` to seed an empty bank.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSeed {
    /// The question itself
    pub text: String,
    /// Whether it goes into the shallow pool
    #[serde(default)]
    pub shallow: bool,
}

/// Adds a question to the bank and returns its id.
#[instrument(skip(db))]
pub fn add_question(
    db: &SqliteDatabase,
    text: &str,
    is_shallow: bool,
    submitted_by: Option<&str>,
) -> Result<i64> {
    let info = db.insert(
        QUESTIONS,
        &row(json!({
            "text": text,
            "is_shallow": is_shallow,
            "submitted_by": submitted_by,
            "created_at": Utc::now().to_rfc3339(),
        })),
    )?;
    Ok(info.last_insert_rowid)
}

/// Fetches one question by id.
#[instrument(skip(db))]
pub fn get_question(db: &SqliteDatabase, id: i64) -> Result<Option<Question>> {
    db.find_one(QUESTIONS, &row(json!({ "id": id })))?
        .map(from_row)
        .transpose()
}

/// Returns the lowest-id question from the channel's pool that has not been
/// asked in that channel yet, or `None` once the pool is exhausted.
#[instrument(skip(db))]
pub fn get_next_question(db: &SqliteDatabase, channel_id: &str) -> Result<Option<Question>> {
    let is_shallow = channels::get_is_shallow(db, channel_id)?;

    let asked: HashSet<i64> = db
        .find(ASKED, &row(json!({ "channel_id": channel_id })))?
        .iter()
        .filter_map(|r| r.get("question_id").and_then(Value::as_i64))
        .collect();

    let mut candidates: Vec<Question> = db
        .find(QUESTIONS, &row(json!({ "is_shallow": is_shallow })))?
        .into_iter()
        .map(from_row)
        .collect::<Result<_>>()?;
    candidates.sort_by_key(|q| q.id);

    let next = candidates.into_iter().find(|q| !asked.contains(&q.id));
    debug!(
        "Next question for channel {}: {:?} ({} already asked)",
        channel_id,
        next.as_ref().map(|q| q.id),
        asked.len()
    );
    Ok(next)
}

/// Records that a question was asked in a channel.
#[instrument(skip(db))]
pub fn set_asked(db: &SqliteDatabase, channel_id: &str, question_id: i64) -> Result<()> {
    db.insert(
        ASKED,
        &row(json!({
            "channel_id": channel_id,
            "question_id": question_id,
            "asked_at": Utc::now().to_rfc3339(),
        })),
    )?;
    Ok(())
}

/// Fills an empty bank with the configured seed questions in one atomic batch.
/// Returns how many questions were inserted (zero if the bank already had some).
#[instrument(skip(db, seeds), fields(count = seeds.len()))]
pub fn seed_questions(db: &SqliteDatabase, seeds: &[QuestionSeed]) -> Result<usize> {
    if seeds.is_empty() || db.find_one(QUESTIONS, &Row::new())?.is_some() {
        debug!("Question bank already populated or nothing to seed.");
        return Ok(0);
    }

    let created_at = Utc::now().to_rfc3339();
    let batch = seeds
        .iter()
        .map(|seed| {
            render_insert_literal(
                QUESTIONS,
                &row(json!({
                    "text": seed.text,
                    "is_shallow": seed.shallow,
                    "created_at": created_at,
                })),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    db.atomic_query(&batch)?;
    info!("Seeded {} questions.", batch.len());
    Ok(batch.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::{create_test_questions, setup_test_db, setup_with_channel};

    #[test]
    fn test_add_and_get_question() -> Result<()> {
        let db = setup_test_db()?;
        let id = add_question(&db, "Would you rather fly or be invisible?", true, Some("55"))?;

        let question = get_question(&db, id)?.unwrap();
        assert_eq!(question.text, "Would you rather fly or be invisible?");
        assert!(question.is_shallow);
        assert_eq!(question.submitted_by.as_deref(), Some("55"));
        assert!(get_question(&db, id + 100)?.is_none());
        Ok(())
    }

    #[test]
    fn test_next_question_skips_asked_ones() -> Result<()> {
        let (db, channel, ids) = setup_with_channel()?;

        let next = get_next_question(&db, &channel.channel_id)?.unwrap();
        assert_eq!(next.id, ids[0]);

        set_asked(&db, &channel.channel_id, ids[0])?;
        set_asked(&db, &channel.channel_id, ids[1])?;
        let next = get_next_question(&db, &channel.channel_id)?.unwrap();
        assert_eq!(next.id, ids[2]);

        set_asked(&db, &channel.channel_id, ids[2])?;
        assert!(get_next_question(&db, &channel.channel_id)?.is_none());
        Ok(())
    }

    #[test]
    fn test_asked_history_is_per_channel() -> Result<()> {
        let (db, channel, ids) = setup_with_channel()?;
        channels::register_channel(&db, "200", None)?;

        set_asked(&db, &channel.channel_id, ids[0])?;
        assert_eq!(get_next_question(&db, "200")?.unwrap().id, ids[0]);
        Ok(())
    }

    #[test]
    fn test_next_question_follows_pool() -> Result<()> {
        let (db, channel, _deep) = setup_with_channel()?;
        let shallow = create_test_questions(&db, &["Cats or dogs?"], true)?;

        channels::flip_shallow(&db, &channel.channel_id)?;
        let next = get_next_question(&db, &channel.channel_id)?.unwrap();
        assert_eq!(next.id, shallow[0]);
        assert!(next.is_shallow);
        Ok(())
    }

    #[test]
    fn test_next_question_for_unknown_channel() -> Result<()> {
        let db = setup_test_db()?;
        assert!(matches!(
            get_next_question(&db, "missing"),
            Err(Error::ChannelNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_seed_questions_only_when_empty() -> Result<()> {
        let db = setup_test_db()?;
        let seeds = vec![
            QuestionSeed {
                text: "What's the best advice you've ever received?".to_string(),
                shallow: false,
            },
            QuestionSeed {
                text: "Pineapple on pizza: yes or no?".to_string(),
                shallow: true,
            },
        ];

        assert_eq!(seed_questions(&db, &seeds)?, 2);
        assert_eq!(seed_questions(&db, &seeds)?, 0);

        let stored = db.find(QUESTIONS, &Row::new())?;
        assert_eq!(stored.len(), 2);
        let first: Question = from_row(stored[0].clone())?;
        assert_eq!(first.text, "What's the best advice you've ever received?");
        assert!(!first.is_shallow);
        Ok(())
    }
}
