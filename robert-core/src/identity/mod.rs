// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity Management Module
//!
//! An identity is created once per registered application: a random idA and
//! the two keys derived from the ECDH agreement with the application key.
//! Keys are only persisted encrypted under the key-encryption key.

mod service;

pub use service::IdentityService;

use chrono::NaiveDate;
use thiserror::Error;

use crate::clock::ClockError;
use crate::crypto::{decrypt, encrypt, CipherError, EncryptionError, SymmetricKey};
use crate::keys::KeyError;
use crate::model::IdA;
use crate::storage::{EncryptedIdentity, StorageError};
use crate::tuples::TuplesError;

/// Identity-related errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Unable to load client public key: {0}")]
    InvalidPublicKey(String),

    #[error("Unable to derive keys from client public key: {0}")]
    KeyDerivationFailed(String),

    #[error("No server key for {0}")]
    MissingServerKey(NaiveDate),

    #[error("Request epoch {request_epoch} and EBID epoch {ebid_epoch} don't match")]
    EbidEpochMismatch { request_epoch: i32, ebid_epoch: i32 },

    #[error("IdA contained in EBID ({0}) was not found in database")]
    UnknownIdentity(IdA),

    #[error("Invalid MAC")]
    InvalidMac,

    #[error("0 ephemeral tuples were generated")]
    NoTuplesGenerated,

    #[error("Bundle end is out of range: {0}")]
    Clock(#[from] ClockError),

    #[error("Tuples serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Tuples(#[from] TuplesError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Identity key encryption failed: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("EBID cipher failed: {0}")]
    Cipher(#[from] CipherError),
}

/// Registered application identity with plaintext keys.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    id_a: IdA,
    key_for_mac: SymmetricKey,
    key_for_tuples: SymmetricKey,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id_a", &self.id_a)
            .finish_non_exhaustive()
    }
}

impl Identity {
    pub fn new(id_a: IdA, key_for_mac: SymmetricKey, key_for_tuples: SymmetricKey) -> Self {
        Identity {
            id_a,
            key_for_mac,
            key_for_tuples,
        }
    }

    pub fn id_a(&self) -> &IdA {
        &self.id_a
    }

    pub fn key_for_mac(&self) -> &SymmetricKey {
        &self.key_for_mac
    }

    pub fn key_for_tuples(&self) -> &SymmetricKey {
        &self.key_for_tuples
    }

    /// Encrypts both keys under the key-encryption key for storage.
    pub fn encrypt(&self, kek: &SymmetricKey) -> Result<EncryptedIdentity, EncryptionError> {
        Ok(EncryptedIdentity {
            id_a: self.id_a,
            key_for_mac_encrypted: encrypt(kek, self.key_for_mac.as_bytes())?,
            key_for_tuples_encrypted: encrypt(kek, self.key_for_tuples.as_bytes())?,
        })
    }

    /// Restores an identity read from storage.
    pub fn decrypt(record: &EncryptedIdentity, kek: &SymmetricKey) -> Result<Self, EncryptionError> {
        let key_for_mac = SymmetricKey::from_slice(&decrypt(kek, &record.key_for_mac_encrypted)?);
        let key_for_tuples =
            SymmetricKey::from_slice(&decrypt(kek, &record.key_for_tuples_encrypted)?);
        Ok(Identity::new(record.id_a, key_for_mac, key_for_tuples))
    }
}
