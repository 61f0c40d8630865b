use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, LoggingConfig, METADATA_DIR,
    RelayConfig, UpdateConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub relay: RelayConfig,
    pub update: UpdateConfig,
}

impl Config {
    /// Load supervisor configuration for an installation.
    ///
    /// Loading order:
    /// 1. Resolve the config directory (SKGC_CONFIG_DIR, else `<root>/skgc/`)
    /// 2. Load config.toml if it exists, else use defaults
    /// 3. Apply SKGC_* environment variable overrides
    ///
    /// The directory is never created here; `init` owns that.
    /// Does NOT validate - call validate() after load().
    pub fn load(root: &Path) -> ConfigErrorResult<Self> {
        let config_path = Self::config_dir(root).join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &PathBuf) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: SKGC_CONFIG_DIR env var > `<root>/skgc/`
    pub fn config_dir(root: &Path) -> PathBuf {
        match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => root.join(METADATA_DIR),
        }
    }

    /// Validate all configuration.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.relay.validate()?;
        self.update.validate()?;

        if let Some(ref file) = self.logging.file
            && (file.is_empty() || file.contains("..") || Path::new(file).is_absolute())
        {
            return Err(ConfigError::logging(
                "logging.file must be a plain relative file name",
            ));
        }

        Ok(())
    }

    /// Absolute path of the supervisor log file, if file logging is configured.
    pub fn log_file_path(&self, root: &Path) -> Option<PathBuf> {
        self.logging.file.as_ref().map(|file| {
            Self::config_dir(root)
                .join(&self.logging.dir)
                .join(file)
        })
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  logging: {} (colored: {}, file: {})",
            *self.logging.level,
            self.logging.colored,
            self.logging.file.as_deref().unwrap_or("-")
        );
        info!(
            "  relay: poll={}ms, settle={}ms, tail={}",
            self.relay.poll_interval_ms, self.relay.settle_delay_ms, self.relay.log_tail_lines
        );
        info!("  update: timeout={}s", self.update.timeout_secs);
    }

    fn apply_env_overrides(&mut self) {
        // Logging
        Self::apply_env_parse("SKGC_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("SKGC_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("SKGC_LOG_FILE", &mut self.logging.file);

        // Relay
        Self::apply_env_parse("SKGC_POLL_INTERVAL_MS", &mut self.relay.poll_interval_ms);
        Self::apply_env_parse("SKGC_SETTLE_DELAY_MS", &mut self.relay.settle_delay_ms);
        Self::apply_env_parse("SKGC_LOG_TAIL_LINES", &mut self.relay.log_tail_lines);

        // Update
        Self::apply_env_string("SKGC_USER_AGENT", &mut self.update.user_agent);
        Self::apply_env_parse("SKGC_UPDATE_TIMEOUT_SECS", &mut self.update.timeout_secs);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
