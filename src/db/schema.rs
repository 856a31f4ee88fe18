//! Schema descriptors and identifier validation.
//!
//! Table and column names are interpolated into SQL text, so they are held to a
//! strict allow-list (`[A-Za-z0-9_]+`) both here and whenever a statement is built.

use crate::errors::{Error, Result};

/// One table to create at startup: a name plus ordered `(column, declared type)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Name of the table
    pub table_name: String,
    /// Ordered column definitions, e.g. `("id", "INTEGER PRIMARY KEY")`
    pub columns: Vec<(String, String)>,
}

impl TableDef {
    /// Starts a table definition with no columns.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        self.columns.push((name.into(), declared_type.into()));
        self
    }

    /// Checks the table name, every column name and every declared type.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.table_name)?;
        if self.columns.is_empty() {
            return Err(Error::EmptyRow {
                table: self.table_name.clone(),
            });
        }
        for (name, declared) in &self.columns {
            validate_identifier(name)?;
            validate_column_type(name, declared)?;
        }
        Ok(())
    }

    /// Renders the idempotent `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_statement(&self) -> Result<String> {
        self.validate()?;
        let columns = self
            .columns
            .iter()
            .map(|(name, declared)| format!("\"{name}\" {declared}"))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({columns});",
            self.table_name
        ))
    }
}

/// Ordered list of tables created when a database is opened.
pub type SchemaDescriptor = Vec<TableDef>;

/// Accepts only non-empty ASCII alphanumeric/underscore names.
pub fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

fn validate_column_type(column: &str, declared: &str) -> Result<()> {
    let valid = !declared.trim().is_empty()
        && declared
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || "_(),.-".contains(c));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidColumnType {
            column: column.to_string(),
            declared: declared.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_statement_quotes_columns() -> Result<()> {
        let table = TableDef::new("users")
            .column("user_id", "TEXT PRIMARY KEY")
            .column("submitted", "INTEGER NOT NULL DEFAULT 0");

        assert_eq!(
            table.create_statement()?,
            "CREATE TABLE IF NOT EXISTS \"users\" (\"user_id\" TEXT PRIMARY KEY, \"submitted\" INTEGER NOT NULL DEFAULT 0);"
        );
        Ok(())
    }

    #[test]
    fn test_identifier_allow_list() {
        assert!(validate_identifier("meta_age").is_ok());
        assert!(validate_identifier("Table2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("bad name").is_err());
        assert!(validate_identifier("x\"y").is_err());
        assert!(validate_identifier("a;b").is_err());
    }

    #[test]
    fn test_rejects_suspicious_declared_type() {
        let table = TableDef::new("t").column("c", "TEXT); DROP TABLE t; --");
        assert!(matches!(
            table.validate(),
            Err(Error::InvalidColumnType { .. })
        ));
    }

    #[test]
    fn test_rejects_table_without_columns() {
        assert!(matches!(
            TableDef::new("empty").create_statement(),
            Err(Error::EmptyRow { .. })
        ));
    }
}
