use crate::tests::{EnvGuard, setup_installation};
use crate::{CONFIG_DIR_ENV, Config, ConfigError};

use googletest::assert_that;
use googletest::prelude::{anything, contains_substring, eq, err, none, ok, pat};
use log::LevelFilter;
use serial_test::serial;

// =========================================================================
// Happy Path Tests
// =========================================================================

#[test]
#[serial]
fn given_no_config_file_when_load_then_ok_with_defaults() {
    // Given
    let (temp, _guard) = setup_installation();

    // When
    let config = Config::load(temp.path()).unwrap();

    // Then
    assert_that!(config.relay.poll_interval_ms, eq(1000));
    assert_that!(config.relay.settle_delay_ms, eq(2000));
    assert_that!(config.relay.log_tail_lines, eq(100));
    assert_that!(config.update.timeout_secs, eq(300));
    assert_that!(*config.logging.level, eq(LevelFilter::Warn));
    assert_that!(config.logging.file, none());
    assert_that!(config.validate(), ok(anything()));
}

#[test]
#[serial]
fn given_missing_metadata_dir_when_load_then_defaults_and_dir_not_created() {
    // Given
    let temp = tempfile::TempDir::new().unwrap();
    let _guard = EnvGuard::remove(CONFIG_DIR_ENV);

    // When
    let result = Config::load(temp.path());

    // Then
    assert_that!(result, ok(anything()));
    assert!(!temp.path().join("skgc").exists());
}

#[test]
#[serial]
fn given_valid_toml_file_when_load_then_uses_toml_values() {
    // Given
    let (temp, _guard) = setup_installation();
    std::fs::write(
        temp.path().join("skgc/config.toml"),
        r#"
            [logging]
            level = "debug"
            file = "skgc.log"

            [relay]
            poll_interval_ms = 250
            settle_delay_ms = 500

            [update]
            user_agent = "skgc-test"
        "#,
    )
    .unwrap();

    // When
    let config = Config::load(temp.path()).unwrap();

    // Then
    assert_that!(*config.logging.level, eq(LevelFilter::Debug));
    assert_that!(config.relay.poll_interval_ms, eq(250));
    assert_that!(config.relay.settle_delay_ms, eq(500));
    assert_that!(config.relay.log_tail_lines, eq(100));
    assert_that!(config.update.user_agent, eq("skgc-test"));
    assert_eq!(
        config.log_file_path(temp.path()),
        Some(temp.path().join("skgc/logs/skgc.log"))
    );
}

#[test]
#[serial]
fn given_env_override_when_load_then_env_wins_over_toml() {
    // Given
    let (temp, _guard) = setup_installation();
    std::fs::write(
        temp.path().join("skgc/config.toml"),
        "[relay]\npoll_interval_ms = 250\n",
    )
    .unwrap();
    let _poll = EnvGuard::set("SKGC_POLL_INTERVAL_MS", "75");
    let _ua = EnvGuard::set("SKGC_USER_AGENT", "from-env");

    // When
    let config = Config::load(temp.path()).unwrap();

    // Then
    assert_that!(config.relay.poll_interval_ms, eq(75));
    assert_that!(config.update.user_agent, eq("from-env"));
}

#[test]
#[serial]
fn given_config_dir_env_when_load_then_reads_from_that_dir() {
    // Given
    let (temp, _guard) = setup_installation();
    let other = tempfile::TempDir::new().unwrap();
    std::fs::write(
        other.path().join("config.toml"),
        "[relay]\nlog_tail_lines = 7\n",
    )
    .unwrap();
    let _dir = EnvGuard::set(CONFIG_DIR_ENV, other.path().to_str().unwrap());

    // When
    let config = Config::load(temp.path()).unwrap();

    // Then
    assert_that!(config.relay.log_tail_lines, eq(7));
}

// =========================================================================
// Error Cases
// =========================================================================

#[test]
#[serial]
fn given_malformed_toml_when_load_then_error_mentions_file() {
    // Given
    let (temp, _guard) = setup_installation();
    std::fs::write(temp.path().join("skgc/config.toml"), "not valid toml {{{{").unwrap();

    // When
    let result = Config::load(temp.path());

    // Then
    assert_that!(result, err(pat!(ConfigError::Toml { .. })));
    let err_msg = format!("{}", result.unwrap_err());
    assert_that!(err_msg, contains_substring("config.toml"));
}

#[test]
#[serial]
fn given_poll_interval_out_of_range_when_validate_then_relay_error() {
    // Given
    let (temp, _guard) = setup_installation();
    let _poll = EnvGuard::set("SKGC_POLL_INTERVAL_MS", "0");

    // When
    let result = Config::load(temp.path()).unwrap().validate();

    // Then
    assert_that!(
        result,
        err(pat!(ConfigError::Generic {
            message: contains_substring("poll_interval_ms"),
            ..
        }))
    );
}

#[test]
#[serial]
fn given_log_file_with_traversal_when_validate_then_error() {
    // Given
    let (temp, _guard) = setup_installation();
    let _file = EnvGuard::set("SKGC_LOG_FILE", "../escape.log");

    // When
    let result = Config::load(temp.path()).unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_empty_user_agent_when_validate_then_update_error() {
    // Given
    let (temp, _guard) = setup_installation();
    let _ua = EnvGuard::set("SKGC_USER_AGENT", "  ");

    // When
    let result = Config::load(temp.path()).unwrap().validate();

    // Then
    assert_that!(
        result,
        err(pat!(ConfigError::Generic {
            message: contains_substring("user_agent"),
            ..
        }))
    );
}
