// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key Commands
//!
//! Daily server key provisioning and keystore inspection.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{NaiveDate, Utc};
use robert_core::crypto::SymmetricKey;
use robert_core::keys::{
    parse_server_key_alias, server_key_alias, KeyRepository, FEDERATION_KEY_ALIAS,
    KEY_ENCRYPTION_KEY_ALIAS, REGISTER_KEY_ALIAS, SERVER_KEY_LEN,
};
use robert_core::storage::Keystore;
use tabled::{Table, Tabled};
use tracing::info;

use crate::config::CliConfig;
use crate::display;

#[derive(Tabled)]
struct AliasRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Role")]
    role: &'static str,
}

fn role(alias: &str) -> &'static str {
    match alias {
        FEDERATION_KEY_ALIAS => "country code mask",
        KEY_ENCRYPTION_KEY_ALIAS => "identity keys at rest",
        REGISTER_KEY_ALIAS => "registration ECDH",
        _ if parse_server_key_alias(alias).is_some() => "daily EBID key",
        _ => "unknown",
    }
}

pub(crate) fn first_day(from: Option<NaiveDate>) -> NaiveDate {
    from.unwrap_or_else(|| Utc::now().date_naive())
}

/// Writes a fresh server key for each of the `days` days from `from` that
/// has none yet. Returns the dates that received a key.
pub(crate) fn provision_server_keys(
    keystore: &dyn Keystore,
    pin: &str,
    from: NaiveDate,
    days: u32,
) -> Result<Vec<NaiveDate>> {
    let existing: BTreeSet<String> = keystore.aliases()?.into_iter().collect();
    let mut added = Vec::new();

    for date in from.iter_days().take(days as usize) {
        let alias = server_key_alias(date);
        if existing.contains(&alias) {
            continue;
        }
        let key = SymmetricKey::generate_with_len(SERVER_KEY_LEN)?;
        keystore.save_key(&alias, key.as_bytes(), pin)?;
        added.push(date);
    }
    Ok(added)
}

/// Dates between the first and last date of `dates` that are missing.
fn gaps(dates: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|date| date <= last)
        .filter(|date| !dates.contains(date))
        .collect()
}

/// Adds daily server keys without touching existing ones.
pub fn add_server_keys(config: &CliConfig, from: Option<NaiveDate>, days: u32) -> Result<()> {
    let pin = config.pin()?;
    if days == 0 {
        bail!("At least one day of server keys is required.");
    }

    let keystore = config.keystore();
    if keystore.load_key(FEDERATION_KEY_ALIAS, pin)?.is_none() {
        display::warning("Keystore has no federation key. Run init first.");
    }

    let from = first_day(from);
    let added = provision_server_keys(&keystore, pin, from, days)?;
    info!(added = added.len(), requested = days, "server keys provisioned");

    if added.is_empty() {
        display::info("Every requested day already has a server key.");
    } else {
        display::success(&format!(
            "Added {} server key(s), {} to {}",
            added.len(),
            added[0],
            added[added.len() - 1]
        ));
    }
    Ok(())
}

/// Lists keystore aliases. Does not need the PIN.
pub fn list(config: &CliConfig) -> Result<()> {
    let aliases = config.keystore().aliases()?;
    if aliases.is_empty() {
        display::info(&format!("No keys in {:?}", config.keystore_dir));
        return Ok(());
    }

    let rows: Vec<AliasRow> = aliases
        .into_iter()
        .map(|alias| AliasRow {
            role: role(&alias),
            alias,
        })
        .collect();

    println!();
    println!("Keys ({}):", rows.len());
    println!("{}", Table::new(rows));
    Ok(())
}

/// Loads every key as the server would and reports what it sees.
pub fn status(config: &CliConfig) -> Result<()> {
    let keys = config.repository()?;
    let cached = keys.cached_key_names();
    let dates: BTreeSet<NaiveDate> = cached
        .iter()
        .filter_map(|alias| parse_server_key_alias(alias))
        .collect();

    println!();
    display::field("Keystore", config.keystore_dir.display());
    display::field("Cached keys", cached.len());
    for alias in [FEDERATION_KEY_ALIAS, KEY_ENCRYPTION_KEY_ALIAS, REGISTER_KEY_ALIAS] {
        let state = if cached.contains(alias) {
            "loaded"
        } else {
            "MISSING"
        };
        display::field(alias, state);
    }
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => {
            display::field("Server keys", format!("{} ({} to {})", dates.len(), first, last))
        }
        _ => display::field("Server keys", 0),
    }
    if let Ok(pair) = keys.get_server_keypair() {
        display::field("Register key", STANDARD.encode(pair.public_key_der()?));
    }
    println!();

    let missing = gaps(&dates);
    if !missing.is_empty() {
        let missing: Vec<String> = missing.iter().map(NaiveDate::to_string).collect();
        display::warning(&format!("Missing server keys: {}", missing.join(", ")));
    }
    let today = Utc::now().date_naive();
    if !dates.contains(&today) {
        display::warning(&format!("No server key for today ({})", today));
    }
    Ok(())
}
