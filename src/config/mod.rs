/// Application settings loaded from config.toml and the environment
pub mod app;

/// Database opening, table creation and seeding
pub mod database;

pub use app::{AppConfig, load_app_configuration};
pub use database::init_database;
