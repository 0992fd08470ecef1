// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the crypto server API. Every error maps to one of
//! the status codes shared with the transport layer:
//!
//! | code | meaning                                  |
//! |------|------------------------------------------|
//! | 400  | malformed request or failed verification |
//! | 404  | unknown idA                              |
//! | 430  | no server key for the requested date     |
//! | 500  | internal error                           |

use std::borrow::Cow;

use thiserror::Error;

use crate::clock::ClockError;
use crate::contact::ContactError;
use crate::identity::IdentityError;
use crate::keys::KeyError;
use crate::model::ModelError;
use crate::storage::StorageError;

use super::config::ConfigError;

/// Error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request field.
    Validation,
    /// The request could not be tied to a registered application.
    Authentication,
    /// No server key for an otherwise valid date.
    KeyAvailability,
    /// Server-side failure the caller cannot fix.
    InvariantViolation,
}

/// Unified error type for crypto server operations.
#[derive(Error, Debug)]
pub enum RobertError {
    /// Request type code outside 1..=4.
    #[error("Unknown request type: {0}")]
    UnknownRequestType(i32),

    /// Negative epoch id.
    #[error("Invalid epoch: {0}")]
    InvalidEpoch(i32),

    /// Fixed-size field with the wrong length or encoding.
    #[error("Invalid field: {0}")]
    InvalidField(#[from] ModelError),

    /// Request time that cannot be represented.
    #[error("Invalid time: {0}")]
    InvalidTime(#[from] ClockError),

    /// HelloMessage send time that does not fit in 16 bits.
    #[error("Invalid HelloMessage time: {0}")]
    InvalidHelloTime(i32),

    /// Bundle covering less than one day.
    #[error("Invalid number of days: {0}")]
    InvalidBundleDays(i32),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for crypto server operations.
pub type RobertResult<T> = Result<T, RobertError>;

type Classification = (ErrorKind, u16, Cow<'static, str>);

const INTERNAL: Classification = (
    ErrorKind::InvariantViolation,
    500,
    Cow::Borrowed("Internal error"),
);

fn validation(description: impl Into<Cow<'static, str>>) -> Classification {
    (ErrorKind::Validation, 400, description.into())
}

fn authentication(status: u16, description: &'static str) -> Classification {
    (ErrorKind::Authentication, status, Cow::Borrowed(description))
}

fn classify_identity(error: &IdentityError) -> Classification {
    match error {
        IdentityError::InvalidPublicKey(_) => validation("Unable to load client public key"),
        IdentityError::KeyDerivationFailed(_) => {
            validation("Unable to derive keys from client public key")
        }
        IdentityError::MissingServerKey(_) => (
            ErrorKind::KeyAvailability,
            430,
            Cow::Borrowed("Missing server key"),
        ),
        IdentityError::EbidEpochMismatch { .. } => {
            authentication(400, "Could not decrypt EBID content")
        }
        IdentityError::UnknownIdentity(_) => authentication(404, "Could not find idA"),
        IdentityError::InvalidMac => authentication(400, "Invalid MAC"),
        IdentityError::NoTuplesGenerated
        | IdentityError::Clock(_)
        | IdentityError::Serialization(_)
        | IdentityError::Keys(_)
        | IdentityError::Tuples(_)
        | IdentityError::Storage(_)
        | IdentityError::Encryption(_)
        | IdentityError::Cipher(_) => INTERNAL,
    }
}

fn classify_model(error: &ModelError) -> Classification {
    match error {
        ModelError::InvalidLength { field, .. } | ModelError::InvalidBase64 { field, .. } => {
            validation(format!("Invalid {}", field))
        }
        ModelError::UnknownRequestType(value) => {
            validation(format!("Unknown request type: {}", value))
        }
    }
}

impl RobertError {
    fn classify(&self) -> Classification {
        match self {
            RobertError::UnknownRequestType(value) => {
                validation(format!("Unknown request type: {}", value))
            }
            RobertError::InvalidEpoch(_) => validation("Invalid epoch"),
            RobertError::InvalidField(e) => classify_model(e),
            RobertError::InvalidTime(_) => validation("Invalid time"),
            RobertError::InvalidHelloTime(_) => validation("Invalid HelloMessage time"),
            RobertError::InvalidBundleDays(_) => validation("Invalid number of days"),
            RobertError::Identity(e) => classify_identity(e),
            RobertError::Contact(ContactError::EbidDecryptionFailed) => {
                authentication(400, "Could not decrypt EBID")
            }
            RobertError::Contact(ContactError::UnknownIdentity(_)) => {
                authentication(404, "Could not find idA")
            }
            RobertError::Contact(ContactError::Identity(e)) => classify_identity(e),
            RobertError::Contact(ContactError::Keys(_) | ContactError::Cipher(_)) => INTERNAL,
            RobertError::Keys(_) | RobertError::Storage(_) | RobertError::Config(_) => INTERNAL,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.classify().0
    }

    /// Status code reported to the transport layer.
    pub fn status_code(&self) -> u16 {
        self.classify().1
    }

    /// Message reported to the transport layer. Never includes key
    /// material or identifiers.
    pub fn description(&self) -> Cow<'static, str> {
        self.classify().2
    }
}
