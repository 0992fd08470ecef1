// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Configuration
//!
//! Configuration for a crypto server instance.

use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDate, TimeDelta};
use thiserror::Error;

use crate::clock::RobertClock;
use crate::contact::DEFAULT_HELLO_TOLERANCE_SECS;

pub const ENV_SERVICE_START_DATE: &str = "ROBERT_SERVICE_START_DATE";
pub const ENV_HELLO_TOLERANCE_SECS: &str = "ROBERT_HELLO_TOLERANCE_SECS";
pub const ENV_KEYSTORE_DIR: &str = "ROBERT_KEYSTORE_DIR";
pub const ENV_KEYSTORE_PIN: &str = "ROBERT_KEYSTORE_PIN";
pub const ENV_DATABASE_PATH: &str = "ROBERT_DATABASE_PATH";
pub const ENV_MAX_BUNDLE_DAYS: &str = "ROBERT_MAX_BUNDLE_DAYS";

/// Longest tuples bundle served by default, in days.
pub const DEFAULT_MAX_BUNDLE_DAYS: u32 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("HelloMessage tolerance must be positive, got {0}s")]
    InvalidTolerance(i64),
    #[error("Keystore PIN is not set")]
    MissingKeystorePin,
    #[error("Maximum bundle length must be at least one day")]
    InvalidMaxBundleDays,
}

/// Configuration for a crypto server instance.
#[derive(Clone)]
pub struct CryptoServerConfig {
    /// First day of epoch 0, at UTC midnight.
    pub service_start_date: NaiveDate,

    /// Clock drift accepted around day boundaries for HelloMessages.
    pub hello_tolerance_secs: i64,

    /// Directory of the file keystore.
    pub keystore_dir: PathBuf,

    /// PIN unlocking the keystore.
    pub keystore_pin: String,

    /// SQLite database holding encrypted identities.
    pub database_path: PathBuf,

    /// Longest tuples bundle a request may ask for.
    pub max_bundle_days: u32,
}

impl Default for CryptoServerConfig {
    fn default() -> Self {
        CryptoServerConfig {
            service_start_date: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap_or_default(),
            hello_tolerance_secs: DEFAULT_HELLO_TOLERANCE_SECS,
            keystore_dir: PathBuf::from("./keystore"),
            keystore_pin: String::new(),
            database_path: PathBuf::from("./robert-identities.db"),
            max_bundle_days: DEFAULT_MAX_BUNDLE_DAYS,
        }
    }
}

impl fmt::Debug for CryptoServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoServerConfig")
            .field("service_start_date", &self.service_start_date)
            .field("hello_tolerance_secs", &self.hello_tolerance_secs)
            .field("keystore_dir", &self.keystore_dir)
            .field("keystore_pin", &"<redacted>")
            .field("database_path", &self.database_path)
            .field("max_bundle_days", &self.max_bundle_days)
            .finish()
    }
}

impl CryptoServerConfig {
    /// Reads the configuration from `ROBERT_*` environment variables,
    /// falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CryptoServerConfig::default();

        if let Some(value) = lookup(ENV_SERVICE_START_DATE) {
            config.service_start_date = NaiveDate::parse_from_str(&value, DATE_FORMAT)
                .map_err(|e| ConfigError::InvalidValue {
                    name: ENV_SERVICE_START_DATE,
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(value) = lookup(ENV_HELLO_TOLERANCE_SECS) {
            config.hello_tolerance_secs =
                value.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidValue {
                        name: ENV_HELLO_TOLERANCE_SECS,
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                })?;
        }
        if let Some(value) = lookup(ENV_KEYSTORE_DIR) {
            config.keystore_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_KEYSTORE_PIN) {
            config.keystore_pin = value;
        }
        if let Some(value) = lookup(ENV_DATABASE_PATH) {
            config.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_MAX_BUNDLE_DAYS) {
            config.max_bundle_days =
                value.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidValue {
                        name: ENV_MAX_BUNDLE_DAYS,
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                })?;
        }

        Ok(config)
    }

    pub fn with_service_start_date(mut self, date: NaiveDate) -> Self {
        self.service_start_date = date;
        self
    }

    pub fn with_hello_tolerance_secs(mut self, seconds: i64) -> Self {
        self.hello_tolerance_secs = seconds;
        self
    }

    pub fn with_keystore_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.keystore_dir = dir.into();
        self
    }

    pub fn with_keystore_pin(mut self, pin: impl Into<String>) -> Self {
        self.keystore_pin = pin.into();
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_max_bundle_days(mut self, days: u32) -> Self {
        self.max_bundle_days = days;
        self
    }

    /// Checks values that have no usable meaning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hello_tolerance_secs <= 0 {
            return Err(ConfigError::InvalidTolerance(self.hello_tolerance_secs));
        }
        if self.keystore_pin.is_empty() {
            return Err(ConfigError::MissingKeystorePin);
        }
        if self.max_bundle_days == 0 {
            return Err(ConfigError::InvalidMaxBundleDays);
        }
        Ok(())
    }

    pub fn clock(&self) -> RobertClock {
        RobertClock::new(self.service_start_date)
    }

    pub fn hello_tolerance(&self) -> TimeDelta {
        TimeDelta::seconds(self.hello_tolerance_secs)
    }
}
