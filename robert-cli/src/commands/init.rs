// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Init Command
//!
//! Creates a keystore holding every key the crypto server needs.

use anyhow::{bail, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDate;
use robert_core::crypto::{ServerKeyPair, SymmetricKey};
use robert_core::keys::{FEDERATION_KEY_ALIAS, KEY_ENCRYPTION_KEY_ALIAS, REGISTER_KEY_ALIAS};
use robert_core::storage::Keystore;
use tracing::info;

use super::keys::{first_day, provision_server_keys};
use crate::config::CliConfig;
use crate::display;

/// Creates the keystore: federation key, key-encryption key, registration
/// key pair and `days` daily server keys starting at `from`.
pub fn run(config: &CliConfig, from: Option<NaiveDate>, days: u32) -> Result<()> {
    let pin = config.pin()?;
    if days == 0 {
        bail!("At least one day of server keys is required.");
    }

    let keystore = config.keystore();
    if !keystore.aliases()?.is_empty() {
        bail!(
            "Keystore already initialized in {:?}. Use add-server-keys to extend it.",
            config.keystore_dir
        );
    }

    keystore.save_key(FEDERATION_KEY_ALIAS, SymmetricKey::generate()?.as_bytes(), pin)?;
    keystore.save_key(
        KEY_ENCRYPTION_KEY_ALIAS,
        SymmetricKey::generate()?.as_bytes(),
        pin,
    )?;
    let register = ServerKeyPair::generate();
    keystore.save_key(REGISTER_KEY_ALIAS, &register.private_bytes(), pin)?;

    let from = first_day(from);
    let added = provision_server_keys(&keystore, pin, from, days)?;
    info!(
        keystore = %config.keystore_dir.display(),
        server_keys = added.len(),
        "keystore initialized"
    );

    display::success(&format!("Keystore created in {:?}", config.keystore_dir));
    println!();
    display::field("Server keys", format!("{} from {}", added.len(), from));
    display::field(
        "Register key",
        STANDARD.encode(register.public_key_der()?),
    );
    println!();
    display::info("Distribute the register public key to applications.");

    Ok(())
}
