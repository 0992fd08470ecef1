// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Country codes and their encrypted form.
//!
//! `ECC = first_byte(AES-ECB(federationKey, EBID || 0^64)) XOR countryCode`

use std::fmt;

use crate::crypto::{aes_ecb_encrypt, CipherError, SymmetricKey};

use super::{decode_base64, encode_base64, fixed, Ebid, ModelError};

/// 1-byte numeric country code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CountryCode(pub u8);

impl CountryCode {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        fixed::<1>("Country code", bytes).map(|[code]| CountryCode(code))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encrypted country code, exactly 1 byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ecc(u8);

impl Ecc {
    pub const LEN: usize = 1;

    pub fn from_byte(value: u8) -> Self {
        Ecc(value)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        fixed::<1>("ECC", bytes).map(|[value]| Ecc(value))
    }

    pub fn from_base64(value: &str) -> Result<Self, ModelError> {
        Self::from_slice(&decode_base64("ECC", value)?)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn to_base64(&self) -> String {
        encode_base64(&[self.0])
    }

    /// Masks `country_code` for the given EBID.
    pub fn encrypt(
        federation_key: &SymmetricKey,
        country_code: CountryCode,
        ebid: &Ebid,
    ) -> Result<Ecc, CipherError> {
        Ok(Ecc(mask(federation_key, ebid)? ^ country_code.0))
    }

    /// Recovers the country code masked for the given EBID.
    pub fn decrypt(
        &self,
        federation_key: &SymmetricKey,
        ebid: &Ebid,
    ) -> Result<CountryCode, CipherError> {
        Ok(CountryCode(mask(federation_key, ebid)? ^ self.0))
    }
}

fn mask(federation_key: &SymmetricKey, ebid: &Ebid) -> Result<u8, CipherError> {
    let mut block = [0u8; 16];
    block[..Ebid::LEN].copy_from_slice(ebid.as_bytes());
    let encrypted = aes_ecb_encrypt(federation_key.as_bytes(), &block)?;
    Ok(encrypted[0])
}

base64_serde!(Ecc);

impl fmt::Debug for Ecc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ecc({})", self.to_base64())
    }
}
