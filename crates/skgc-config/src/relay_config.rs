use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_LOG_TAIL_LINES, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SETTLE_DELAY_MS, MAX_POLL_INTERVAL_MS, MAX_SETTLE_DELAY_MS, MIN_POLL_INTERVAL_MS,
};

use std::time::Duration;

use serde::Deserialize;

/// Timing of the console relay and the command correlator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Forward-loop tick and console-follow cadence
    pub poll_interval_ms: u64,
    /// Wait between sending a command and scanning the console log
    pub settle_delay_ms: u64,
    /// Lines replayed when attaching to the console
    pub log_tail_lines: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::relay(format!(
                "relay.poll_interval_ms must be {}-{}, got {}",
                MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, self.poll_interval_ms
            )));
        }

        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(ConfigError::relay(format!(
                "relay.settle_delay_ms must be at most {}, got {}",
                MAX_SETTLE_DELAY_MS, self.settle_delay_ms
            )));
        }

        if self.log_tail_lines == 0 {
            return Err(ConfigError::relay("relay.log_tail_lines must be at least 1"));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
