// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use crate::crypto::{CipherError, Skinny64, SymmetricKey};

use super::{decode_base64, encode_base64, fixed, BluetoothIdentifier, ModelError};

/// Encrypted Bluetooth identifier, exactly 8 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ebid([u8; Ebid::LEN]);

impl Ebid {
    pub const LEN: usize = 8;

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Ebid(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        fixed("EBID", bytes).map(Ebid)
    }

    pub fn from_base64(value: &str) -> Result<Self, ModelError> {
        Self::from_slice(&decode_base64("EBID", value)?)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        encode_base64(&self.0)
    }

    /// Decrypts with a 24-byte server key.
    ///
    /// Any key yields some identifier; callers check the epoch id to detect
    /// a wrong-day key.
    pub fn decrypt(&self, server_key: &SymmetricKey) -> Result<BluetoothIdentifier, CipherError> {
        let cipher = Skinny64::new(server_key.as_bytes())?;
        let plain = cipher.decrypt_block(&self.0)?;
        Ok(BluetoothIdentifier::from_bytes(&plain))
    }
}

impl TryFrom<&[u8]> for Ebid {
    type Error = ModelError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

base64_serde!(Ebid);

impl fmt::Debug for Ebid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ebid({})", self.to_base64())
    }
}
