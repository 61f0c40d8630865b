use skgc_config::ConfigError;
use skgc_core::SupervisorError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("Logger error: {message}")]
    Logger { message: String },

    #[error("Invalid misc data: {message}")]
    InvalidMisc { message: String },
}

impl CliError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Supervisor(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::Supervisor(e) => e.recovery_hint(),
            Self::Config(_) => Some("Check skgc/config.toml and SKGC_* environment variables."),
            Self::InvalidMisc { .. } => Some("Pass a JSON object, e.g. '{\"key\": \"value\"}'."),
            Self::Logger { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
