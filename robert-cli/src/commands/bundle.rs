// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle Command
//!
//! Decrypts a tuples bundle the way an application does, for diagnostics.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use robert_core::crypto::{decrypt, SymmetricKey};
use robert_core::model::EphemeralTuple;
use tabled::{Table, Tabled};

use crate::config::CliConfig;

#[derive(Tabled)]
struct TupleRow {
    #[tabled(rename = "Epoch")]
    epoch_id: i32,
    #[tabled(rename = "Start (UTC)")]
    start: String,
    #[tabled(rename = "EBID")]
    ebid: String,
    #[tabled(rename = "ECC")]
    ecc: String,
}

/// Opens a bundle sealed with `tuples_key`.
pub fn open(tuples_key: &str, data: &str) -> Result<Vec<EphemeralTuple>> {
    let key = STANDARD
        .decode(tuples_key.trim())
        .context("Tuples key is not valid base64")?;
    let data = STANDARD
        .decode(data.trim())
        .context("Bundle is not valid base64")?;

    let json = decrypt(&SymmetricKey::from_slice(&key), &data)
        .context("Cannot decrypt bundle with this tuples key")?;
    serde_json::from_slice(&json).context("Bundle does not contain tuples")
}

pub fn run(config: &CliConfig, tuples_key: &str, data: &str, json: bool) -> Result<()> {
    let tuples = open(tuples_key, data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tuples)?);
        return Ok(());
    }

    let clock = config.clock();
    let rows: Vec<TupleRow> = tuples
        .iter()
        .map(|tuple| TupleRow {
            epoch_id: tuple.epoch_id,
            start: clock
                .at_epoch(tuple.epoch_id)
                .as_datetime()
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            ebid: tuple.ebid.to_base64(),
            ecc: tuple.ecc.to_base64(),
        })
        .collect();

    println!("Tuples ({}):", rows.len());
    println!("{}", Table::new(rows));
    Ok(())
}
