// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HelloMessages broadcast between devices.
//!
//! ```text
//! +----------------------------------------------------------------+
//! |                    HelloMessage (128 bits)                     |
//! +----------------------------------------------------------------+
//! | ECC          | EBID           | Time           | MAC           |
//! |     (1 byte) |      (8 bytes) |      (2 bytes) |     (5 bytes) |
//! +----------------------------------------------------------------+
//! ```
//!
//! The MAC is the first 5 bytes of
//! `HMAC-SHA256(keyForMac, HELLO salt || ECC || EBID || time16)`.

use std::fmt;

use crate::crypto::{hmac_sha256, verify_hmac_sha256, SymmetricKey};

use super::{fixed, Ebid, Ecc, ModelError, RequestType};

/// Truncated HelloMessage MAC, exactly 5 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HelloMessageMac([u8; HelloMessageMac::LEN]);

impl HelloMessageMac {
    pub const LEN: usize = 5;

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        HelloMessageMac(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        fixed("HelloMessage MAC", bytes).map(HelloMessageMac)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Debug for HelloMessageMac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HelloMessageMac({})", hex::encode(self.0))
    }
}

/// Broadcast content covered by the HelloMessage MAC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HelloMessage {
    pub ecc: Ecc,
    pub ebid: Ebid,
    /// Low 16 bits of the NTP send time.
    pub time: u16,
}

impl HelloMessage {
    pub fn new(ecc: Ecc, ebid: Ebid, time: u16) -> Self {
        HelloMessage { ecc, ebid, time }
    }

    pub fn compute_mac(&self, key_for_mac: &SymmetricKey) -> HelloMessageMac {
        let (salt, ecc, time) = self.mac_fields();
        let mac = hmac_sha256(
            key_for_mac.as_bytes(),
            &[&salt, &ecc, self.ebid.as_bytes(), &time],
        );
        let mut truncated = [0u8; HelloMessageMac::LEN];
        truncated.copy_from_slice(&mac[..HelloMessageMac::LEN]);
        HelloMessageMac(truncated)
    }

    pub fn verify_mac(&self, key_for_mac: &SymmetricKey, mac: &HelloMessageMac) -> bool {
        let (salt, ecc, time) = self.mac_fields();
        verify_hmac_sha256(
            key_for_mac.as_bytes(),
            &[&salt, &ecc, self.ebid.as_bytes(), &time],
            mac.as_bytes(),
        )
    }

    fn mac_fields(&self) -> ([u8; 1], [u8; 1], [u8; 2]) {
        (
            [RequestType::Hello.salt()],
            [self.ecc.value()],
            self.time.to_be_bytes(),
        )
    }
}

/// One received HelloMessage as reported in a contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HelloMessageDetail {
    /// Low 16 bits of the NTP send time, as broadcast.
    pub time_sent: u16,
    /// NTP seconds at which the receiving device recorded the message.
    pub time_received: i64,
    pub mac: HelloMessageMac,
}

impl HelloMessageDetail {
    pub fn new(time_sent: u16, time_received: i64, mac: HelloMessageMac) -> Self {
        HelloMessageDetail {
            time_sent,
            time_received,
            mac,
        }
    }
}
