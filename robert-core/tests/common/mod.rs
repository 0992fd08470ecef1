// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared fixtures used across test modules: reference keys, keystores
//! populated for given dates and helpers building client-side requests.

#![allow(dead_code)]

pub mod strategies;

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};

use robert_core::clock::{RobertClock, RobertInstant};
use robert_core::contact::{HelloMessageValidator, DEFAULT_HELLO_TOLERANCE_SECS};
use robert_core::crypto::{ServerKeyPair, SymmetricKey};
use robert_core::identity::{Identity, IdentityService};
use robert_core::keys::{
    server_key_alias, KeyRepository, KeystoreKeyRepository, FEDERATION_KEY_ALIAS,
    KEY_ENCRYPTION_KEY_ALIAS, REGISTER_KEY_ALIAS,
};
use robert_core::model::{
    AuthMac, BluetoothIdentifier, CountryCode, Credentials, Ebid, Ecc, HelloMessage,
    HelloMessageDetail, IdA, RequestType,
};
use robert_core::storage::{Keystore, MemoryIdentityStore, MemoryKeystore};

// ============================================================
// Reference Values
// ============================================================

pub const PIN: &str = "1234";
pub const START_DATE: &str = "2022-08-01";
pub const COUNTRY: CountryCode = CountryCode(33);
pub const REFERENCE_ID_A: &str = "8nPoETw=";

pub fn clock() -> RobertClock {
    RobertClock::parse(START_DATE).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Federation key shared with the reference tuples.
pub fn federation_key() -> SymmetricKey {
    SymmetricKey::from_slice(&b"Federation key for java unit tests"[..32])
}

/// Server key shared with the reference tuples.
pub fn reference_server_key() -> Vec<u8> {
    b"Secret key for java unit tests"[..24].to_vec()
}

/// A 24-byte server key unique to `date`.
pub fn daily_server_key(date: NaiveDate) -> Vec<u8> {
    format!("test server key {}", date.format("%Y%m%d")).into_bytes()
}

pub fn reference_id_a() -> IdA {
    IdA::from_base64(REFERENCE_ID_A).unwrap()
}

// ============================================================
// Keystores
// ============================================================

/// Keystore with the global keys and no server key.
pub fn base_keystore() -> Arc<MemoryKeystore> {
    let keystore = Arc::new(MemoryKeystore::new(PIN));
    keystore
        .save_key(FEDERATION_KEY_ALIAS, federation_key().as_bytes(), PIN)
        .unwrap();
    keystore
        .save_key(
            KEY_ENCRYPTION_KEY_ALIAS,
            SymmetricKey::generate().unwrap().as_bytes(),
            PIN,
        )
        .unwrap();
    keystore
        .save_key(
            REGISTER_KEY_ALIAS,
            &ServerKeyPair::generate().private_bytes(),
            PIN,
        )
        .unwrap();
    keystore
}

/// Keystore where every date in `dates` has the reference server key.
pub fn reference_keystore(dates: &[NaiveDate]) -> Arc<MemoryKeystore> {
    let keystore = base_keystore();
    for date in dates {
        keystore
            .save_key(&server_key_alias(*date), &reference_server_key(), PIN)
            .unwrap();
    }
    keystore
}

/// Keystore where every date in `dates` has its own server key.
pub fn daily_keystore(dates: &[NaiveDate]) -> Arc<MemoryKeystore> {
    let keystore = base_keystore();
    for date in dates {
        keystore
            .save_key(&server_key_alias(*date), &daily_server_key(*date), PIN)
            .unwrap();
    }
    keystore
}

/// Loaded key repository over `keystore`.
pub fn repository(keystore: Arc<MemoryKeystore>) -> Arc<KeystoreKeyRepository> {
    let keys = Arc::new(KeystoreKeyRepository::new(keystore, PIN));
    keys.reload(PIN).unwrap();
    keys
}

// ============================================================
// Services
// ============================================================

/// Services wired over in-memory collaborators.
pub struct TestServer {
    pub clock: RobertClock,
    pub keys: Arc<KeystoreKeyRepository>,
    pub store: Arc<MemoryIdentityStore>,
    pub identities: Arc<IdentityService>,
}

impl TestServer {
    pub fn new(keystore: Arc<MemoryKeystore>) -> Self {
        let clock = clock();
        let keys = repository(keystore);
        let store = Arc::new(MemoryIdentityStore::new());
        let identities = Arc::new(IdentityService::new(clock, keys.clone(), store.clone()));
        TestServer {
            clock,
            keys,
            store,
            identities,
        }
    }

    pub fn validator(&self) -> HelloMessageValidator {
        HelloMessageValidator::new(
            self.clock,
            self.keys.clone(),
            self.identities.clone(),
            TimeDelta::seconds(DEFAULT_HELLO_TOLERANCE_SECS),
        )
    }

    /// Registers a new application with a freshly generated client key.
    pub fn register(&self) -> Identity {
        let client = ServerKeyPair::generate();
        self.identities
            .create_identity(&client.public_key_der().unwrap())
            .unwrap()
    }

    /// EBID of `id_a` for `epoch_id`, encrypted with the stored key of the
    /// epoch's date.
    pub fn ebid(&self, id_a: IdA, epoch_id: i32) -> Ebid {
        let date = self.clock.at_epoch(epoch_id).utc_date();
        let key = self.keys.get_server_key(date).unwrap();
        BluetoothIdentifier::new(epoch_id, id_a).encrypt(&key).unwrap()
    }

    pub fn ecc(&self, country: CountryCode, ebid: &Ebid) -> Ecc {
        Ecc::encrypt(&federation_key(), country, ebid).unwrap()
    }

    /// Credentials as built by the application of `identity`.
    pub fn credentials(
        &self,
        identity: &Identity,
        request_type: RequestType,
        epoch_id: i32,
    ) -> Credentials {
        let time = self.request_time(epoch_id);
        let ebid = self.ebid(*identity.id_a(), epoch_id);
        let mac = Credentials::compute_mac(
            identity.key_for_mac(),
            request_type,
            &ebid,
            epoch_id,
            &time,
        );
        Credentials::new(request_type, epoch_id, time, ebid, mac)
    }

    /// Request time used by [`Self::credentials`]: 10 seconds into the epoch.
    pub fn request_time(&self, epoch_id: i32) -> RobertInstant {
        self.clock.at_epoch(epoch_id).plus(TimeDelta::seconds(10)).unwrap()
    }
}

/// HelloMessage detail sent at `sent` and received at `received`.
pub fn hello_detail(
    identity: &Identity,
    ecc: Ecc,
    ebid: Ebid,
    sent: &RobertInstant,
    received: &RobertInstant,
) -> HelloMessageDetail {
    let time_sent = sent.as_16_lsb_of_ntp();
    let mac = HelloMessage::new(ecc, ebid, time_sent).compute_mac(identity.key_for_mac());
    HelloMessageDetail::new(time_sent, received.as_ntp_timestamp(), mac)
}

/// An all-zero MAC of the right length.
pub fn zero_mac() -> AuthMac {
    AuthMac::from_slice(&[0u8; 32]).unwrap()
}
