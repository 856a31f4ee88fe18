use crate::db::query::{Statement, build_insert_query, build_select_query, build_update_query};
use crate::db::schema::TableDef;
use crate::db::value::{Row, decode_row, from_sql_value, to_sql_value};
use crate::errors::{Error, Result};
use rusqlite::{Connection, TransactionBehavior, params_from_iter, types::Value as SqlValue};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// What the store reports after an insert or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionInfo {
    /// Rowid of the most recent successful insert on this connection
    pub last_insert_rowid: i64,
    /// Number of rows the statement changed
    pub changes: usize,
}

/// A single SQLite file wrapped in a key/value CRUD façade.
///
/// The connection is owned by this value and closed when it is dropped. Share it
/// with `Arc<SqliteDatabase>`; every call takes the inner lock for its duration
/// and blocks until SQLite is done.
#[derive(Debug)]
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteDatabase {
    /// Opens (creating if absent) the database file at `path`.
    #[instrument]
    pub fn open(path: &str) -> Result<Self> {
        debug!("Opening database connection to: {}", path);
        let conn = Connection::open(path)
            .map_err(|e| Error::Database(format!("Failed to open database at {path}: {e}")))?;
        Self::from_connection(conn, path)
    }

    /// Opens the database and creates every table in `schema` that does not exist yet.
    #[instrument(skip(schema))]
    pub fn open_with_schema(path: &str, schema: &[TableDef]) -> Result<Self> {
        let db = Self::open(path)?;
        db.init_tables(schema)?;
        Ok(db)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("Failed to open in-memory database: {e}")))?;
        Self::from_connection(conn, ":memory:")
    }

    fn from_connection(conn: Connection, path: &str) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(|e| Error::Database(format!("Failed to enable foreign keys: {e}")))?;
        info!("Database connection opened at {}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_string(),
        })
    }

    /// Path the connection was opened with.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))
    }

    /// Issues `CREATE TABLE IF NOT EXISTS` for each table inside one exclusive
    /// transaction. Either every table is ensured or none of the statements stick.
    #[instrument(skip(self, schema), fields(tables = schema.len()))]
    pub fn init_tables(&self, schema: &[TableDef]) -> Result<()> {
        let statements = schema
            .iter()
            .map(TableDef::create_statement)
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
        for sql in &statements {
            tx.execute_batch(sql).map_err(|e| {
                Error::Database(format!("Failed to create table with `{sql}`: {e}"))
            })?;
            info!("{} -> ok", sql);
        }
        tx.commit()
            .map_err(|e| Error::Database(format!("Failed to commit table creation: {e}")))?;
        info!("Database tables ensured ({} tables).", statements.len());
        Ok(())
    }

    /// Inserts one row (flattened first) and returns the store's execution info.
    #[instrument(skip(self, row))]
    pub fn insert(&self, table: &str, row: &Row) -> Result<ExecutionInfo> {
        let stmt = build_insert_query(table, row)?;
        let info = self.execute_in_transaction(&stmt)?;
        info!(
            "{} -> changes: {}, last_insert_rowid: {}",
            stmt, info.changes, info.last_insert_rowid
        );
        Ok(info)
    }

    /// Returns every row matching `filter` (all rows for an empty filter), decoded.
    #[instrument(skip(self, filter))]
    pub fn find(&self, table: &str, filter: &Row) -> Result<Vec<Row>> {
        let stmt = build_select_query(table, filter)?;
        let rows = self.query_rows(&stmt, None)?;
        info!("{} -> {} rows", stmt, rows.len());
        Ok(rows)
    }

    /// Like [`find`](Self::find) but returns at most one row.
    #[instrument(skip(self, filter))]
    pub fn find_one(&self, table: &str, filter: &Row) -> Result<Option<Row>> {
        let stmt = build_select_query(table, filter)?;
        let row = self.query_rows(&stmt, Some(1))?.into_iter().next();
        info!("{} -> found: {}", stmt, row.is_some());
        Ok(row)
    }

    /// Sets `values` on every row matching `filter`. An empty filter updates all rows.
    #[instrument(skip(self, values, filter))]
    pub fn update(&self, table: &str, values: &Row, filter: &Row) -> Result<ExecutionInfo> {
        let stmt = build_update_query(table, values, filter)?;
        let info = self.execute_in_transaction(&stmt)?;
        info!("{} -> changes: {}", stmt, info.changes);
        Ok(info)
    }

    /// Runs fully formed statements in order inside one exclusive transaction.
    ///
    /// If any statement fails the whole batch is rolled back and the error returned.
    #[instrument(skip(self, statements), fields(count = statements.len()))]
    pub fn atomic_query<S: AsRef<str>>(&self, statements: &[S]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
        for sql in statements {
            tx.execute_batch(sql.as_ref()).inspect_err(|e| {
                info!("{} -> failed: {}", sql.as_ref(), e);
            })?;
            info!("{} -> ok", sql.as_ref());
        }
        tx.commit()?;
        info!("Committed batch of {} statements.", statements.len());
        Ok(())
    }

    fn execute_in_transaction(&self, stmt: &Statement) -> Result<ExecutionInfo> {
        let bound = bind(stmt)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let changes = tx.prepare(&stmt.sql)?.execute(params_from_iter(bound.iter()))?;
        let info = ExecutionInfo {
            last_insert_rowid: tx.last_insert_rowid(),
            changes,
        };
        tx.commit()?;
        Ok(info)
    }

    fn query_rows(&self, stmt: &Statement, limit: Option<usize>) -> Result<Vec<Row>> {
        let bound = bind(stmt)?;
        let conn = self.lock()?;
        let mut prepared = conn.prepare(&stmt.sql)?;
        let columns: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = prepared.query(params_from_iter(bound.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, column) in columns.iter().enumerate() {
                record.insert(column.clone(), from_sql_value(column, row.get_ref(idx)?)?);
            }
            out.push(decode_row(record)?);
            if limit.is_some_and(|max| out.len() >= max) {
                break;
            }
        }
        Ok(out)
    }
}

fn bind(stmt: &Statement) -> Result<Vec<SqlValue>> {
    stmt.params
        .iter()
        .map(|(field, value)| to_sql_value(field, value))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::db::query::render_insert_literal;
    use crate::test_utils::{capture_logs, init_test_tracing};
    use serde_json::{Value, json};

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    fn notes_schema() -> Vec<TableDef> {
        vec![
            TableDef::new("notes")
                .column("id", "INTEGER PRIMARY KEY AUTOINCREMENT")
                .column("body", "TEXT")
                .column("pinned", "INTEGER")
                .column("meta_author", "TEXT"),
        ]
    }

    fn setup() -> Result<SqliteDatabase> {
        init_test_tracing();
        let db = SqliteDatabase::open_in_memory()?;
        db.init_tables(&notes_schema())?;
        Ok(db)
    }

    #[test]
    fn test_insert_then_find_one_returns_original_value() -> Result<()> {
        let db = SqliteDatabase::open_in_memory()?;
        db.init_tables(&[TableDef::new("single").column("value", "TEXT")])?;

        let info = db.insert("single", &row(json!({"value": "it's 50% off; \"really\""})))?;
        assert_eq!(info.changes, 1);
        assert_eq!(info.last_insert_rowid, 1);

        let found = db
            .find_one("single", &row(json!({"value": "it's 50% off; \"really\""})))?
            .unwrap();
        assert_eq!(found["value"], json!("it's 50% off; \"really\""));
        Ok(())
    }

    #[test]
    fn test_nested_rows_are_flattened_on_insert() -> Result<()> {
        let db = setup()?;
        db.insert("notes", &row(json!({"body": "hi", "meta": {"author": "kai"}})))?;

        let found = db.find_one("notes", &row(json!({"meta": {"author": "kai"}})))?;
        assert_eq!(found.unwrap()["body"], json!("hi"));
        Ok(())
    }

    #[test]
    fn test_booleans_round_trip_as_integers() -> Result<()> {
        let db = setup()?;
        db.insert("notes", &row(json!({"body": "a", "pinned": true})))?;
        db.insert("notes", &row(json!({"body": "b", "pinned": false})))?;

        let pinned = db.find("notes", &row(json!({"pinned": true})))?;
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0]["pinned"], json!(1));

        let all = db.find("notes", &Row::new())?;
        let flags: Vec<&Value> = all.iter().map(|r| &r["pinned"]).collect();
        assert_eq!(flags, vec![&json!(1), &json!(0)]);
        Ok(())
    }

    #[test]
    fn test_find_returns_empty_when_nothing_matches() -> Result<()> {
        let db = setup()?;
        assert!(db.find("notes", &row(json!({"body": "missing"})))?.is_empty());
        assert!(db.find_one("notes", &row(json!({"body": "missing"})))?.is_none());
        Ok(())
    }

    #[test]
    fn test_find_one_returns_first_of_many() -> Result<()> {
        let db = setup()?;
        for body in ["first", "second", "third"] {
            db.insert("notes", &row(json!({"body": body, "pinned": true})))?;
        }
        let found = db.find_one("notes", &row(json!({"pinned": true})))?.unwrap();
        assert_eq!(found["body"], json!("first"));
        assert_eq!(db.find("notes", &row(json!({"pinned": true})))?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_update_with_filter() -> Result<()> {
        let db = setup()?;
        db.insert("notes", &row(json!({"body": "a", "pinned": false})))?;
        db.insert("notes", &row(json!({"body": "b", "pinned": false})))?;

        let info = db.update(
            "notes",
            &row(json!({"pinned": true})),
            &row(json!({"body": "b"})),
        )?;
        assert_eq!(info.changes, 1);

        let pinned = db.find("notes", &row(json!({"pinned": true})))?;
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0]["body"], json!("b"));
        Ok(())
    }

    #[test]
    fn test_update_without_filter_updates_all_rows() -> Result<()> {
        let db = setup()?;
        db.insert("notes", &row(json!({"body": "a"})))?;
        db.insert("notes", &row(json!({"body": "b"})))?;

        let info = db.update("notes", &row(json!({"pinned": true})), &Row::new())?;
        assert_eq!(info.changes, 2);
        assert_eq!(db.find("notes", &row(json!({"pinned": 1})))?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_unknown_table_fails_at_execution() -> Result<()> {
        let db = setup()?;
        let result = db.insert("nope", &row(json!({"body": "a"})));
        match result {
            Err(Error::Rusqlite(e)) => assert!(e.to_string().contains("no such table")),
            other => panic!("expected a store error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_atomic_query_commits_all_statements() -> Result<()> {
        let db = setup()?;
        let batch = vec![
            render_insert_literal("notes", &row(json!({"body": "one 'quoted'"})))?,
            render_insert_literal("notes", &row(json!({"body": "two", "pinned": true})))?,
        ];
        db.atomic_query(&batch)?;

        let all = db.find("notes", &Row::new())?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["body"], json!("one 'quoted'"));
        assert_eq!(all[1]["pinned"], json!(1));
        Ok(())
    }

    #[test]
    fn test_atomic_query_rolls_back_on_mid_batch_failure() -> Result<()> {
        init_test_tracing();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("atomic.sqlite");
        let path = path.to_str().unwrap();

        {
            let db = SqliteDatabase::open_with_schema(path, &notes_schema())?;
            db.insert("notes", &row(json!({"body": "existing"})))?;

            let batch = vec![
                render_insert_literal("notes", &row(json!({"body": "first"})))?,
                render_insert_literal("notes", &row(json!({"body": "second"})))?,
                "INSERT INTO \"missing_table\" (\"x\") VALUES (1);".to_string(),
            ];
            assert!(db.atomic_query(&batch).is_err());

            let all = db.find("notes", &Row::new())?;
            assert_eq!(all.len(), 1, "no statement from the failed batch may persist");
        }

        // Reopen to confirm nothing partial reached the file.
        let reopened = SqliteDatabase::open(path)?;
        let all = reopened.find("notes", &Row::new())?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["body"], json!("existing"));
        Ok(())
    }

    #[test]
    fn test_init_tables_is_idempotent_and_atomic() -> Result<()> {
        let db = setup()?;
        db.init_tables(&notes_schema())?;

        let result = db.init_tables(&[
            TableDef::new("fresh").column("a", "TEXT"),
            TableDef::new("bad name").column("a", "TEXT"),
        ]);
        assert!(matches!(result, Err(Error::InvalidIdentifier { .. })));
        assert!(db.find("fresh", &Row::new()).is_err(), "no table from a failed init may exist");
        Ok(())
    }

    #[test]
    fn test_init_tables_rolls_back_on_store_failure() -> Result<()> {
        let db = setup()?;
        let result = db.init_tables(&[
            TableDef::new("fresh").column("a", "TEXT"),
            TableDef::new("broken").column("a", "TEXT PRIMARY KEY PRIMARY KEY"),
        ]);
        assert!(result.is_err());
        assert!(db.find("fresh", &Row::new()).is_err());
        Ok(())
    }

    #[test]
    fn test_table_and_batch_logs_include_sql() -> Result<()> {
        let db = SqliteDatabase::open_in_memory()?;
        let (result, logs) = capture_logs(|| -> Result<()> {
            db.init_tables(&notes_schema())?;
            db.atomic_query(&[render_insert_literal(
                "notes",
                &row(json!({"body": "logged"})),
            )?])
        });
        result?;

        assert!(logs.contains("CREATE TABLE IF NOT EXISTS \"notes\""), "{logs}");
        assert!(
            logs.contains("INSERT INTO \"notes\" (\"body\") VALUES ('logged'); -> ok"),
            "{logs}"
        );
        Ok(())
    }
}
