use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_UPDATE_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    MAX_UPDATE_TIMEOUT_SECS, MIN_UPDATE_TIMEOUT_SECS,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// `User-Agent` header sent with artifact downloads
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            user_agent: String::from(DEFAULT_USER_AGENT),
            timeout_secs: DEFAULT_UPDATE_TIMEOUT_SECS,
        }
    }
}

impl UpdateConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::update("update.user_agent cannot be empty"));
        }

        if !(MIN_UPDATE_TIMEOUT_SECS..=MAX_UPDATE_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ConfigError::update(format!(
                "update.timeout_secs must be {}-{}, got {}",
                MIN_UPDATE_TIMEOUT_SECS, MAX_UPDATE_TIMEOUT_SECS, self.timeout_secs
            )));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
