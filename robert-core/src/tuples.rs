// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Ephemeral Tuples Generator
//!
//! Produces the (EBID, ECC) pair of every requested epoch for one idA. Each
//! EBID is encrypted with the server key of the epoch's UTC date; epochs of a
//! date without server key are skipped.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;

use crate::clock::RobertInstant;
use crate::crypto::{CipherError, Skinny64};
use crate::keys::{KeyError, KeyRepository};
use crate::model::{BluetoothIdentifier, CountryCode, Ebid, Ecc, EphemeralTuple, IdA};

/// Tuple generation error types.
#[derive(Error, Debug)]
pub enum TuplesError {
    #[error(transparent)]
    Keys(#[from] KeyError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Generates ephemeral tuples for one application.
pub struct TuplesGenerator<'a> {
    country_code: CountryCode,
    id_a: IdA,
    keys: &'a dyn KeyRepository,
}

impl<'a> TuplesGenerator<'a> {
    pub fn new(country_code: CountryCode, id_a: IdA, keys: &'a dyn KeyRepository) -> Self {
        TuplesGenerator {
            country_code,
            id_a,
            keys,
        }
    }

    /// Returns one tuple per epoch, in the order of `epochs`.
    ///
    /// Each distinct date's server key is fetched once. The result is shorter
    /// than the input when some dates have no server key.
    pub fn generate(&self, epochs: &[RobertInstant]) -> Result<Vec<EphemeralTuple>, TuplesError> {
        if epochs.is_empty() {
            return Ok(Vec::new());
        }

        let federation_key = self.keys.get_federation_key()?;
        let mut ciphers: BTreeMap<NaiveDate, Option<Skinny64>> = BTreeMap::new();
        let mut skipped: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut tuples = Vec::with_capacity(epochs.len());

        for epoch in epochs {
            let date = epoch.utc_date();
            if !ciphers.contains_key(&date) {
                let cipher = match self.keys.get_server_key(date) {
                    Some(key) => Some(Skinny64::new(key.as_bytes())?),
                    None => None,
                };
                ciphers.insert(date, cipher);
            }

            let Some(Some(cipher)) = ciphers.get(&date) else {
                *skipped.entry(date).or_default() += 1;
                continue;
            };

            let epoch_id = epoch.as_epoch_id();
            let bluetooth_identifier = BluetoothIdentifier::new(epoch_id, self.id_a);
            let ebid = cipher
                .encrypt_block(&bluetooth_identifier.to_bytes())
                .map(Ebid::from_bytes)?;
            let ecc = Ecc::encrypt(&federation_key, self.country_code, &ebid)?;
            tuples.push(EphemeralTuple::new(epoch_id, ebid, ecc));
        }

        if !skipped.is_empty() {
            let days: Vec<String> = skipped.keys().map(NaiveDate::to_string).collect();
            warn!(
                skipped_days = skipped.len(),
                skipped_epochs = skipped.values().sum::<usize>(),
                days = %days.join(", "),
                "no server key for some days, their tuples were not generated"
            );
        }

        Ok(tuples)
    }
}
