//! Configuration consistency checks.
//!
//! Run with: cargo test --test config_test

use sensor_explorer::config::{Config, ConfigError};

#[test]
fn defaults_are_consistent() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn default_limit_outside_bounds_is_rejected() {
    let config = Config {
        observations_default_limit: 20,
        ..Config::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            name: "OBSERVATIONS_DEFAULT_LIMIT",
            ..
        }
    ));

    let config = Config {
        observations_default_limit: 5_000,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn inverted_bounds_are_rejected() {
    let config = Config {
        observations_min_limit: 500,
        observations_max_limit: 100,
        observations_default_limit: 200,
        ..Config::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            name: "OBSERVATIONS_MIN_LIMIT",
            ..
        }
    ));
}
