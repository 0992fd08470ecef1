// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identifier Model
//!
//! Fixed-size binary structures exchanged with applications: the application
//! identifier, Bluetooth identifiers and their encrypted form, encrypted
//! country codes, request credentials and HelloMessages.

/// Serde support for fixed-size values carried as base64 strings.
///
/// Defined ahead of the submodules so they see it in textual scope.
macro_rules! base64_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base64())
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <String as serde::Deserialize>::deserialize(deserializer)?;
                <$ty>::from_base64(&value).map_err(serde::de::Error::custom)
            }
        }
    };
}

mod bluetooth;
mod country;
mod credentials;
mod ebid;
mod hello;
mod id_a;
mod tuple;

pub use bluetooth::BluetoothIdentifier;
pub use country::{CountryCode, Ecc};
pub use credentials::{AuthMac, Credentials, RequestType};
pub use ebid::Ebid;
pub use hello::{HelloMessage, HelloMessageDetail, HelloMessageMac};
pub use id_a::IdA;
pub use tuple::EphemeralTuple;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Model construction error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{field} must be {expected} bytes long but was {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid base64 for {field}: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },
    #[error("Unknown request type: {0}")]
    UnknownRequestType(i32),
}

/// Copies `bytes` into a fixed-size array named `field` for error reporting.
pub(crate) fn fixed<const N: usize>(
    field: &'static str,
    bytes: &[u8],
) -> Result<[u8; N], ModelError> {
    bytes.try_into().map_err(|_| ModelError::InvalidLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

pub(crate) fn decode_base64(field: &'static str, value: &str) -> Result<Vec<u8>, ModelError> {
    STANDARD
        .decode(value)
        .map_err(|e| ModelError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
