pub mod config;
pub mod history;

pub use config::{AppConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
pub use history::HistorySettings;
