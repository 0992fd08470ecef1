// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Authenticated request credentials.
//!
//! ```text
//! +------------------------------------------------------------+
//! |          Credentials MAC input (136 bits / 17 bytes)       |
//! +------------------------------------------------------------+
//! | Salt     | EBID           | Epoch id       | Time          |
//! |  (1 byte)|      (8 bytes) |  (4 bytes, BE) |      (time32) |
//! +------------------------------------------------------------+
//! ```

use std::fmt;

use crate::clock::RobertInstant;
use crate::crypto::{hmac_sha256, verify_hmac_sha256, SymmetricKey, HMAC_SHA256_LEN};

use super::{fixed, Ebid, ModelError};

/// Request kind, used as the first byte (salt) of MAC inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestType {
    Hello,
    Status,
    Unregister,
    DeleteHistory,
}

impl RequestType {
    pub fn salt(self) -> u8 {
        match self {
            RequestType::Hello => 1,
            RequestType::Status => 2,
            RequestType::Unregister => 3,
            RequestType::DeleteHistory => 4,
        }
    }

    pub fn from_value(value: i32) -> Result<Self, ModelError> {
        match value {
            1 => Ok(RequestType::Hello),
            2 => Ok(RequestType::Status),
            3 => Ok(RequestType::Unregister),
            4 => Ok(RequestType::DeleteHistory),
            other => Err(ModelError::UnknownRequestType(other)),
        }
    }
}

impl TryFrom<i32> for RequestType {
    type Error = ModelError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// HMAC-SHA-256 attached to authenticated requests, exactly 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthMac([u8; HMAC_SHA256_LEN]);

impl AuthMac {
    pub const LEN: usize = HMAC_SHA256_LEN;

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        fixed("MAC", bytes).map(AuthMac)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Debug for AuthMac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthMac({})", hex::encode(self.0))
    }
}

/// Credentials attached to authenticated requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub request_type: RequestType,
    pub epoch_id: i32,
    pub time: RobertInstant,
    pub ebid: Ebid,
    pub mac: AuthMac,
}

impl Credentials {
    pub fn new(
        request_type: RequestType,
        epoch_id: i32,
        time: RobertInstant,
        ebid: Ebid,
        mac: AuthMac,
    ) -> Self {
        Credentials {
            request_type,
            epoch_id,
            time,
            ebid,
            mac,
        }
    }

    /// Computes the MAC an application attaches to such a request.
    pub fn compute_mac(
        key_for_mac: &SymmetricKey,
        request_type: RequestType,
        ebid: &Ebid,
        epoch_id: i32,
        time: &RobertInstant,
    ) -> AuthMac {
        let salt = [request_type.salt()];
        let epoch = epoch_id.to_be_bytes();
        let time32 = time.as_time32();
        AuthMac(hmac_sha256(
            key_for_mac.as_bytes(),
            &[&salt, ebid.as_bytes(), &epoch, &time32],
        ))
    }

    /// Checks the attached MAC against the identity's MAC key.
    pub fn has_valid_checksum(&self, key_for_mac: &SymmetricKey) -> bool {
        let salt = [self.request_type.salt()];
        let epoch = self.epoch_id.to_be_bytes();
        let time32 = self.time.as_time32();
        verify_hmac_sha256(
            key_for_mac.as_bytes(),
            &[&salt, self.ebid.as_bytes(), &epoch, &time32],
            self.mac.as_bytes(),
        )
    }
}
