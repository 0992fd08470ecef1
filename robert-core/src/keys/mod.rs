// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key Repository
//!
//! Server key material by role and by calendar date:
//!
//! | alias                 | role                                      |
//! |-----------------------|-------------------------------------------|
//! | `federation-key`      | masks country codes (ECC)                 |
//! | `key-encryption-key`  | encrypts identity keys at rest            |
//! | `register-key`        | ECDH P-256 registration key pair          |
//! | `server-key-yyyyMMdd` | 24-byte Skinny64 key for EBIDs of the day |

mod cache;

pub use cache::KeystoreKeyRepository;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use thiserror::Error;

use crate::crypto::{ServerKeyPair, SymmetricKey};
use crate::storage::StorageError;

pub const FEDERATION_KEY_ALIAS: &str = "federation-key";
pub const KEY_ENCRYPTION_KEY_ALIAS: &str = "key-encryption-key";
pub const REGISTER_KEY_ALIAS: &str = "register-key";
pub const SERVER_KEY_ALIAS_PREFIX: &str = "server-key-";

const SERVER_KEY_DATE_FORMAT: &str = "%Y%m%d";

/// Length of daily server keys (Skinny-64-192).
pub const SERVER_KEY_LEN: usize = 24;

/// Key repository error types.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Missing key material: {0}")]
    MissingKeyMaterial(String),

    #[error("Invalid key material for '{alias}': {reason}")]
    InvalidKeyMaterial { alias: String, reason: String },

    #[error("Keystore error: {0}")]
    Keystore(#[from] StorageError),
}

/// Returns the keystore alias of the server key for `date`.
pub fn server_key_alias(date: NaiveDate) -> String {
    format!(
        "{}{}",
        SERVER_KEY_ALIAS_PREFIX,
        date.format(SERVER_KEY_DATE_FORMAT)
    )
}

/// Extracts the date from a `server-key-yyyyMMdd` alias.
pub fn parse_server_key_alias(alias: &str) -> Option<NaiveDate> {
    let date = alias.strip_prefix(SERVER_KEY_ALIAS_PREFIX)?;
    NaiveDate::parse_from_str(date, SERVER_KEY_DATE_FORMAT).ok()
}

/// Read access to server keys, cached in process.
///
/// `get_server_key` never substitutes another day's key; callers decide
/// whether to try adjacent days.
pub trait KeyRepository: Send + Sync {
    /// Returns the server key of `date`, or None if there is none.
    fn get_server_key(&self, date: NaiveDate) -> Option<SymmetricKey>;

    fn get_federation_key(&self) -> Result<SymmetricKey, KeyError>;

    fn get_key_encryption_key(&self) -> Result<SymmetricKey, KeyError>;

    fn get_server_keypair(&self) -> Result<ServerKeyPair, KeyError>;

    /// Re-reads every role and every dated server key from the keystore.
    fn reload(&self, pin: &str) -> Result<(), KeyError>;

    /// Aliases currently held in the cache.
    fn cached_key_names(&self) -> BTreeSet<String>;
}
