//! Row values: flattening, quoting, and the percent-encoded storage convention.
//!
//! Rows travel through the façade as ordered JSON objects. String values are
//! percent-encoded before they reach the store (both when bound to a placeholder
//! and when rendered inline) and decoded again when rows are read back, so a
//! caller always sees the value it wrote.

use crate::db::schema::validate_identifier;
use crate::errors::{Error, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;

/// A single-level or nested field → value mapping. Insertion order is preserved.
pub type Row = Map<String, Value>;

/// Separator used when joining nested keys during flattening.
pub const FLATTEN_SEPARATOR: &str = "_";

/// Collapses nested objects into a single level, joining ancestor keys with `_`.
///
/// `{"meta": {"age": 5}}` becomes `{"meta_age": 5}`. Leaf values keep their type
/// and keys keep the iteration order of the input. Flattening an already flat
/// row returns an identical row.
///
/// Keys that collide once joined (`{"a_b": 1, "a": {"b": 2}}`) collapse into a
/// single field: the value seen last wins and the field keeps the position of
/// its first occurrence.
#[must_use]
pub fn flatten(row: &Row, prefix: Option<&str>) -> Row {
    let mut flat = Row::new();
    flatten_into(&mut flat, row, prefix);
    flat
}

fn flatten_into(out: &mut Row, row: &Row, prefix: Option<&str>) {
    for (key, value) in row {
        let name = prefix.map_or_else(|| key.clone(), |p| format!("{p}{FLATTEN_SEPARATOR}{key}"));
        match value {
            Value::Object(nested) => flatten_into(out, nested, Some(&name)),
            leaf => {
                out.insert(name, leaf.clone());
            }
        }
    }
}

/// Percent-encodes a string for storage.
#[must_use]
pub fn encode_text(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

/// Reverses [`encode_text`].
pub fn decode_text(text: &str) -> Result<String> {
    urlencoding::decode(text)
        .map(Cow::into_owned)
        .map_err(|e| Error::Decode(format!("'{text}' is not valid UTF-8 once decoded: {e}")))
}

/// Wraps a validated table or column name in double quotes.
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{name}\""))
}

/// Renders a scalar for inline use in SQL text.
///
/// With `as_identifier` set, strings are treated as table/column names and
/// double-quoted. Otherwise strings are percent-encoded and single-quoted,
/// `null` stays `null`, booleans become `1`/`0` and numbers pass through.
pub fn quote_value(value: &Value, as_identifier: bool) -> Result<String> {
    quote_field("value", value, as_identifier)
}

pub(crate) fn quote_field(field: &str, value: &Value, as_identifier: bool) -> Result<String> {
    match value {
        Value::String(s) if as_identifier => quote_identifier(s),
        Value::String(s) => Ok(format!("'{}'", encode_text(s))),
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(i64::from(*b).to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(unsupported(field, other)),
    }
}

/// Reverses the percent-encoding on every string field of a row read from the store.
pub fn decode_row(row: Row) -> Result<Row> {
    row.into_iter()
        .map(|(field, value)| match value {
            Value::String(s) => Ok((field, Value::String(decode_text(&s)?))),
            other => Ok((field, other)),
        })
        .collect()
}

/// Converts a flattened field value into what gets bound to a `?` placeholder.
pub(crate) fn to_sql_value(field: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .ok_or_else(|| unsupported(field, value)),
        Value::String(s) => Ok(SqlValue::Text(encode_text(s))),
        other => Err(unsupported(field, other)),
    }
}

/// Converts a column read from the store into a JSON value. Text is returned
/// still encoded; run the row through [`decode_row`] afterwards.
pub(crate) fn from_sql_value(column: &str, value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::from(i)),
        ValueRef::Real(f) => Ok(Number::from_f64(f).map_or(Value::Null, Value::Number)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| Error::Decode(format!("column '{column}' holds invalid UTF-8: {e}"))),
        ValueRef::Blob(bytes) => Ok(Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())),
    }
}

fn unsupported(field: &str, value: &Value) -> Error {
    let kind = match value {
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Number(_) => "number",
        _ => "scalar",
    };
    Error::UnsupportedValue {
        field: field.to_string(),
        kind,
    }
}
