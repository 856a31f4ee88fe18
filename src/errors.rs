//! Unified error type for the question bot and its storage layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid identifier '{name}': only ASCII letters, digits and '_' are allowed")]
    InvalidIdentifier { name: String },

    #[error("Invalid declared type '{declared}' for column '{column}'")]
    InvalidColumnType { column: String, declared: String },

    #[error("Refusing to build a statement for table '{table}' with no fields")]
    EmptyRow { table: String },

    #[error("Field '{field}' holds an unsupported {kind} value")]
    UnsupportedValue { field: String, kind: &'static str },

    #[error("Failed to decode stored value: {0}")]
    Decode(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("Channel {channel_id} is not registered")]
    ChannelNotFound { channel_id: String },

    #[error("Invalid question: {reason}")]
    InvalidSubmission { reason: String },

    #[error("Daily submission limit of {limit} reached")]
    SubmissionLimit { limit: i64 },

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
