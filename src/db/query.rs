//! Statement builders. Pure string construction; nothing here touches the store.

use crate::db::value::{Row, flatten, quote_field, quote_identifier};
use crate::errors::{Error, Result};
use serde_json::Value;
use std::fmt;

const CONDITION_JOINER: &str = " AND ";

/// SQL text plus the values to bind to its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The rendered SQL
    pub sql: String,
    /// `(field, value)` pairs in placeholder order
    pub params: Vec<(String, Value)>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// `INSERT INTO "table" ("a", "b") VALUES (?, ?);`
pub fn build_insert_query(table: &str, row: &Row) -> Result<Statement> {
    let flat = flatten(row, None);
    if flat.is_empty() {
        return Err(empty(table));
    }
    let columns = quoted_columns(&flat)?;
    let placeholders = vec!["?"; flat.len()].join(", ");
    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            quote_identifier(table)?,
            columns.join(", ")
        ),
        params: flat.into_iter().collect(),
    })
}

/// `SELECT * FROM "table" WHERE "a" = ? AND ...;`, or a full scan for an empty filter.
pub fn build_select_query(table: &str, filter: &Row) -> Result<Statement> {
    let flat = flatten(filter, None);
    let mut sql = format!("SELECT * FROM {}", quote_identifier(table)?);
    if !flat.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&assignments(&flat)?.join(CONDITION_JOINER));
    }
    sql.push(';');
    Ok(Statement {
        sql,
        params: flat.into_iter().collect(),
    })
}

/// `UPDATE "table" SET "a" = ? WHERE "b" = ?;`
///
/// An empty filter updates every row: the `WHERE` clause is left out entirely.
/// Parameters are the SET values followed by the filter values.
pub fn build_update_query(table: &str, values: &Row, filter: &Row) -> Result<Statement> {
    let set = flatten(values, None);
    if set.is_empty() {
        return Err(empty(table));
    }
    let conditions = flatten(filter, None);

    let mut sql = format!(
        "UPDATE {} SET {}",
        quote_identifier(table)?,
        assignments(&set)?.join(", ")
    );
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&assignments(&conditions)?.join(CONDITION_JOINER));
    }
    sql.push(';');

    Ok(Statement {
        sql,
        params: set.into_iter().chain(conditions).collect(),
    })
}

/// Renders an insert with the values inlined as quoted literals, for use in
/// [`SqliteDatabase::atomic_query`](crate::db::SqliteDatabase::atomic_query) batches.
pub fn render_insert_literal(table: &str, row: &Row) -> Result<String> {
    let flat = flatten(row, None);
    if flat.is_empty() {
        return Err(empty(table));
    }
    let columns = quoted_columns(&flat)?;
    let values = flat
        .iter()
        .map(|(field, value)| quote_field(field, value, false))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        quote_identifier(table)?,
        columns.join(", "),
        values.join(", ")
    ))
}

fn quoted_columns(flat: &Row) -> Result<Vec<String>> {
    flat.keys().map(|k| quote_identifier(k)).collect()
}

fn assignments(flat: &Row) -> Result<Vec<String>> {
    flat.keys()
        .map(|k| quote_identifier(k).map(|q| format!("{q} = ?")))
        .collect()
}

fn empty(table: &str) -> Error {
    Error::EmptyRow {
        table: table.to_string(),
    }
}
