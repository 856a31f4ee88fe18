//! Key/value-to-SQL CRUD façade over an embedded `SQLite` file.
//!
//! Callers hand in plain JSON objects describing rows and filters; the façade
//! flattens them, builds parameterized statements, runs writes inside
//! transactions and hands back decoded rows.

pub mod connection;
pub mod query;
pub mod schema;
pub mod value;

pub use connection::{ExecutionInfo, SqliteDatabase};
pub use query::{
    Statement, build_insert_query, build_select_query, build_update_query, render_insert_literal,
};
pub use schema::{SchemaDescriptor, TableDef, validate_identifier};
pub use value::{Row, decode_row, flatten, quote_value};
