// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use rand::RngCore;

use super::{decode_base64, encode_base64, fixed, ModelError};

/// 5-byte pseudonymous application identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdA([u8; IdA::LEN]);

impl IdA {
    pub const LEN: usize = 5;

    /// Generates a random identifier.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        IdA(bytes)
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        IdA(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        fixed("IdA", bytes).map(IdA)
    }

    pub fn from_base64(value: &str) -> Result<Self, ModelError> {
        Self::from_slice(&decode_base64("IdA", value)?)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        encode_base64(&self.0)
    }
}

base64_serde!(IdA);

impl fmt::Display for IdA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for IdA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdA({})", self.to_base64())
    }
}
