// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Contact Module
//!
//! Validates contacts reported by applications: the (ECC, EBID) pair a peer
//! broadcast and the HelloMessages received from it.

mod validator;

pub use validator::{HelloMessageValidator, DEFAULT_HELLO_TOLERANCE_SECS};

use thiserror::Error;

use crate::crypto::CipherError;
use crate::identity::IdentityError;
use crate::keys::KeyError;
use crate::model::{BluetoothIdentifier, CountryCode, HelloMessageDetail, IdA};

/// Contact validation error types.
#[derive(Error, Debug)]
pub enum ContactError {
    #[error("Could not decrypt EBID")]
    EbidDecryptionFailed,

    #[error("Could not find keys for idA {0}")]
    UnknownIdentity(IdA),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("EBID cipher failed: {0}")]
    Cipher(#[from] CipherError),
}

/// Outcome of a contact validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContactValidationResult {
    /// The ECC names a country served by another federation member.
    UnsupportedCountry(CountryCode),
    /// The EBID belongs to one of our identities.
    Valid(ValidContact),
}

/// A contact whose EBID was resolved to a registered application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidContact {
    pub country_code: CountryCode,
    pub bluetooth_identifier: BluetoothIdentifier,
    /// Details rejected for their timestamps or MAC, in submission order.
    pub invalid_details: Vec<HelloMessageDetail>,
}

impl ContactValidationResult {
    pub fn country_code(&self) -> CountryCode {
        match self {
            ContactValidationResult::UnsupportedCountry(code) => *code,
            ContactValidationResult::Valid(contact) => contact.country_code,
        }
    }
}
