//! Per-user submission counters, reset each day.

use crate::{
    db::SqliteDatabase,
    errors::{Error, Result},
    store::{USERS, from_row, row},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Submission bookkeeping for one Discord user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Discord user id
    pub user_id: String,
    /// Questions submitted on `last_submitted`
    pub submitted: i64,
    /// Day of the most recent submission (`YYYY-MM-DD`)
    pub last_submitted: Option<String>,
}

impl UserInfo {
    /// Submissions counted against `today`.
    #[must_use]
    pub fn submitted_on(&self, today: NaiveDate) -> i64 {
        let same_day = self
            .last_submitted
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
            == Some(today);
        if same_day { self.submitted } else { 0 }
    }
}

/// Looks up a user's submission record.
#[instrument(skip(db))]
pub fn get_user_info(db: &SqliteDatabase, user_id: &str) -> Result<Option<UserInfo>> {
    db.find_one(USERS, &row(json!({ "user_id": user_id })))?
        .map(from_row)
        .transpose()
}

/// Fails with [`Error::SubmissionLimit`] if the user already used up `today`'s
/// submissions. Nothing is recorded.
#[instrument(skip(db))]
pub fn ensure_can_submit(
    db: &SqliteDatabase,
    user_id: &str,
    today: NaiveDate,
    daily_limit: i64,
) -> Result<()> {
    let count = get_user_info(db, user_id)?.map_or(0, |user| user.submitted_on(today));
    if count >= daily_limit {
        return Err(Error::SubmissionLimit { limit: daily_limit });
    }
    Ok(())
}

/// Counts one submission for `today`, refusing once `daily_limit` is reached.
#[instrument(skip(db))]
pub fn record_submission(
    db: &SqliteDatabase,
    user_id: &str,
    today: NaiveDate,
    daily_limit: i64,
) -> Result<UserInfo> {
    let day = today.format(DATE_FORMAT).to_string();

    match get_user_info(db, user_id)? {
        None => {
            db.insert(
                USERS,
                &row(json!({ "user_id": user_id, "submitted": 1, "last_submitted": day })),
            )?;
        }
        Some(user) => {
            let count = user.submitted_on(today);
            if count >= daily_limit {
                return Err(Error::SubmissionLimit { limit: daily_limit });
            }
            db.update(
                USERS,
                &row(json!({ "submitted": count + 1, "last_submitted": day })),
                &row(json!({ "user_id": user_id })),
            )?;
        }
    }

    let user = get_user_info(db, user_id)?.ok_or_else(|| {
        Error::Database(format!("User {user_id} missing right after recording a submission"))
    })?;
    info!("User {} has submitted {} question(s) today", user_id, user.submitted);
    Ok(user)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_first_submission_creates_user() -> Result<()> {
        let db = setup_test_db()?;
        assert!(get_user_info(&db, "1")?.is_none());

        let user = record_submission(&db, "1", day(1), 3)?;
        assert_eq!(user.submitted, 1);
        assert_eq!(user.last_submitted.as_deref(), Some("2024-05-01"));
        Ok(())
    }

    #[test]
    fn test_daily_limit_enforced_and_reset() -> Result<()> {
        let db = setup_test_db()?;
        record_submission(&db, "1", day(1), 2)?;
        record_submission(&db, "1", day(1), 2)?;
        assert!(matches!(
            record_submission(&db, "1", day(1), 2),
            Err(Error::SubmissionLimit { limit: 2 })
        ));

        let next_day = record_submission(&db, "1", day(2), 2)?;
        assert_eq!(next_day.submitted, 1);
        assert_eq!(next_day.submitted_on(day(2)), 1);
        assert_eq!(next_day.submitted_on(day(3)), 0);
        Ok(())
    }

    #[test]
    fn test_ensure_can_submit_does_not_count() -> Result<()> {
        let db = setup_test_db()?;
        ensure_can_submit(&db, "1", day(1), 1)?;
        ensure_can_submit(&db, "1", day(1), 1)?;
        assert!(get_user_info(&db, "1")?.is_none());

        record_submission(&db, "1", day(1), 1)?;
        assert!(matches!(
            ensure_can_submit(&db, "1", day(1), 1),
            Err(Error::SubmissionLimit { limit: 1 })
        ));
        ensure_can_submit(&db, "1", day(2), 1)?;
        Ok(())
    }
}
