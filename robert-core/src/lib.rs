// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! ROBERT Crypto Core
//!
//! Cryptographic core of the ROBERT proximity-tracing server: epochs and
//! protocol time, EBID/ECC tuples, authenticated request verification and
//! HelloMessage contact validation.
//! Symmetric primitives use the audited `ring` crate, except the Skinny64
//! block cipher which has no audited implementation.

pub mod api;
pub mod clock;
pub mod contact;
pub mod crypto;
pub mod identity;
pub mod keys;
pub mod model;
pub mod storage;
pub mod tuples;

pub use api::{CryptoServerConfig, ErrorKind, RobertCryptoServer, RobertError, RobertResult};
pub use clock::{RobertClock, RobertInstant, EPOCH_DURATION_SECS};
pub use contact::{ContactValidationResult, HelloMessageValidator, ValidContact};
pub use crypto::SymmetricKey;
pub use identity::{Identity, IdentityService};
pub use keys::{KeyRepository, KeystoreKeyRepository};
pub use model::{
    AuthMac, BluetoothIdentifier, CountryCode, Credentials, Ebid, Ecc, EphemeralTuple,
    HelloMessage, HelloMessageDetail, HelloMessageMac, IdA, RequestType,
};
pub use storage::{
    FileKeystore, IdentityStore, Keystore, MemoryIdentityStore, MemoryKeystore, Storage,
    StorageError,
};
pub use tuples::TuplesGenerator;
