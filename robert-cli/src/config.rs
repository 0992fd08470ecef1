// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Configuration

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use robert_core::api::CryptoServerConfig;
use robert_core::clock::RobertClock;
use robert_core::keys::{KeyRepository, KeystoreKeyRepository};
use robert_core::storage::FileKeystore;
use std::sync::Arc;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory of the file keystore.
    pub keystore_dir: PathBuf,
    /// Keystore PIN, from `--pin` or the environment.
    pub pin: Option<String>,
    /// First day of epoch 0.
    pub start_date: NaiveDate,
}

impl CliConfig {
    /// Returns the keystore PIN or fails when none was given.
    pub fn pin(&self) -> Result<&str> {
        match self.pin.as_deref() {
            Some(pin) if !pin.is_empty() => Ok(pin),
            _ => bail!("Keystore PIN is not set. Use --pin or ROBERT_KEYSTORE_PIN."),
        }
    }

    pub fn keystore(&self) -> FileKeystore {
        FileKeystore::new(self.keystore_dir.clone())
    }

    /// Server configuration matching these options.
    pub fn server_config(&self) -> Result<CryptoServerConfig> {
        let config = CryptoServerConfig::default()
            .with_service_start_date(self.start_date)
            .with_keystore_dir(self.keystore_dir.clone())
            .with_keystore_pin(self.pin()?);
        config.validate()?;
        Ok(config)
    }

    pub fn clock(&self) -> RobertClock {
        RobertClock::new(self.start_date)
    }

    /// Key repository over the file keystore with every key loaded.
    pub fn repository(&self) -> Result<KeystoreKeyRepository> {
        let config = self.server_config()?;
        let keystore = Arc::new(FileKeystore::new(config.keystore_dir.clone()));
        let keys = KeystoreKeyRepository::new(keystore, config.keystore_pin.clone());
        keys.reload(&config.keystore_pin)?;
        Ok(keys)
    }
}

// INLINE_TEST_REQUIRED: Binary crate without lib.rs - tests cannot be external
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(pin: Option<&str>) -> CliConfig {
        CliConfig {
            keystore_dir: PathBuf::from("./keystore"),
            pin: pin.map(str::to_string),
            start_date: NaiveDate::from_ymd_opt(2022, 8, 1).unwrap(),
        }
    }

    #[test]
    fn test_pin_is_required() {
        assert!(config(None).pin().is_err());
        assert!(config(Some("")).pin().is_err());
        assert_eq!(config(Some("1234")).pin().unwrap(), "1234");
    }

    #[test]
    fn test_server_config_uses_options() {
        let server = config(Some("1234")).server_config().unwrap();

        assert_eq!(server.clock().start_date().to_string(), "2022-08-01");
        assert_eq!(server.keystore_dir, PathBuf::from("./keystore"));
    }

    #[test]
    fn test_repository_on_empty_keystore() {
        let temp_dir = tempdir().unwrap();
        let config = CliConfig {
            keystore_dir: temp_dir.path().to_path_buf(),
            ..config(Some("1234"))
        };

        let keys = config.repository().unwrap();

        assert!(keys.cached_key_names().is_empty());
    }
}
