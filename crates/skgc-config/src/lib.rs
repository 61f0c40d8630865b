mod config;
mod error;
mod log_level;
mod logging_config;
mod relay_config;
mod update_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use relay_config::RelayConfig;
pub use update_config::UpdateConfig;

/// Name of the supervisor metadata directory inside an installation root.
pub const METADATA_DIR: &str = "skgc";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const CONFIG_DIR_ENV: &str = "SKGC_CONFIG_DIR";

const DEFAULT_LOG_LEVEL_STRING: &str = "warn";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Warn;
const DEFAULT_LOG_DIRECTORY: &str = "logs";
const DEFAULT_LOG_COLORED: bool = true;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const MIN_POLL_INTERVAL_MS: u64 = 10;
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
const MAX_SETTLE_DELAY_MS: u64 = 60_000;
const DEFAULT_LOG_TAIL_LINES: usize = 100;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";
const DEFAULT_UPDATE_TIMEOUT_SECS: u64 = 300;
const MIN_UPDATE_TIMEOUT_SECS: u64 = 1;
const MAX_UPDATE_TIMEOUT_SECS: u64 = 3600;
