//! Bot configuration loading from config.toml
//!
//! Every field has a default, so a missing or partial config file still yields
//! a usable configuration. `DATABASE_PATH` in the environment overrides the
//! database location from the file.

use crate::errors::{Error, Result};
use crate::store::questions::QuestionSeed;
use croner::Cron;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `SQLite` file holding channels, questions and users
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Cron expression (local time) for the daily post
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// How far downvotes must lead upvotes before a question is skipped
    #[serde(default = "default_skip_margin")]
    pub skip_margin: u64,
    /// Longest accepted question, in characters
    #[serde(default = "default_max_question_length")]
    pub max_question_length: usize,
    /// Questions one user may submit per day
    #[serde(default = "default_daily_submission_limit")]
    pub daily_submission_limit: i64,
    /// Channel ids registered at startup
    #[serde(default)]
    pub channels: Vec<u64>,
    /// Questions used to seed an empty bank
    #[serde(default)]
    pub questions: Vec<QuestionSeed>,
}

fn default_database_path() -> String {
    "data/questions.sqlite".to_string()
}

fn default_schedule() -> String {
    "0 9 * * *".to_string()
}

const fn default_skip_margin() -> u64 {
    3
}

const fn default_max_question_length() -> usize {
    300
}

const fn default_daily_submission_limit() -> i64 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            schedule: default_schedule(),
            skip_margin: default_skip_margin(),
            max_question_length: default_max_question_length(),
            daily_submission_limit: default_daily_submission_limit(),
            channels: Vec::new(),
            questions: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Checks the values that would otherwise only fail at runtime.
    pub fn validate(&self) -> Result<()> {
        parse_schedule(&self.schedule)?;
        if self.max_question_length == 0 {
            return Err(Error::Config {
                message: "max_question_length must be greater than zero".to_string(),
            });
        }
        if self.daily_submission_limit < 1 {
            return Err(Error::Config {
                message: "daily_submission_limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses a 5- or 6-field cron expression.
pub fn parse_schedule(expr: &str) -> Result<Cron> {
    Cron::from_str(expr)
        .map_err(|e| Error::Schedule(format!("invalid cron expression '{expr}': {e}")))
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails validation
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Parses and validates configuration text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads the application configuration from `CONFIG_PATH` (default `config.toml`),
/// falling back to defaults when the file does not exist, then applies
/// environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        warn!("Config file {} not found, using defaults.", path);
        AppConfig::default()
    };

    if let Ok(database_path) = std::env::var("DATABASE_PATH") {
        info!("DATABASE_PATH overrides database_path: {}", database_path);
        config.database_path = database_path;
    }

    info!(
        "Configuration loaded: {} channels, {} seed questions, schedule '{}'",
        config.channels.len(),
        config.questions.len(),
        config.schedule
    );
    Ok(config)
}
