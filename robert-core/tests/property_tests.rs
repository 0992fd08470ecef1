// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Property-Based Tests
//!
//! Uses proptest to verify properties that should hold for all inputs,
//! not just the reference vectors.

mod common;

use proptest::prelude::*;

use chrono::TimeDelta;
use common::strategies::*;
use common::clock;
use robert_core::crypto::{skinny64_decrypt, skinny64_encrypt, SymmetricKey};
use robert_core::model::{
    BluetoothIdentifier, CountryCode, Credentials, Ecc, EphemeralTuple, RequestType,
};

// ============================================================
// Block Ciphers
// ============================================================

proptest! {
    /// Property: Skinny64 decryption inverts encryption for any key
    #[test]
    fn prop_skinny64_inverts(
        key in server_key_strategy(),
        block in prop::array::uniform8(any::<u8>())
    ) {
        let ciphertext = skinny64_encrypt(&key, &block).unwrap();
        prop_assert_eq!(skinny64_decrypt(&key, &ciphertext).unwrap(), block);
    }

    /// Property: An EBID decrypts to the identifier it was built from
    #[test]
    fn prop_ebid_recovers_identifier(
        key in server_key_strategy(),
        identifier in bluetooth_identifier_strategy()
    ) {
        let key = SymmetricKey::from_slice(&key);
        let ebid = identifier.encrypt(&key).unwrap();
        prop_assert_eq!(ebid.decrypt(&key).unwrap(), identifier);
    }

    /// Property: The country code is recovered from the ECC of any EBID
    #[test]
    fn prop_ecc_recovers_country(
        key in prop::array::uniform32(any::<u8>()),
        country in any::<u8>(),
        ebid in ebid_strategy()
    ) {
        let key = SymmetricKey::from_slice(&key);
        let ecc = Ecc::encrypt(&key, CountryCode(country), &ebid).unwrap();
        prop_assert_eq!(ecc.decrypt(&key, &ebid).unwrap(), CountryCode(country));
    }
}

// ============================================================
// Identifier Layout
// ============================================================

proptest! {
    /// Property: The 8-byte layout keeps epoch and idA apart
    #[test]
    fn prop_identifier_bytes_roundtrip(identifier in bluetooth_identifier_strategy()) {
        let bytes = identifier.to_bytes();
        prop_assert_eq!(&bytes[3..], identifier.id_a.as_bytes());
        prop_assert_eq!(BluetoothIdentifier::from_bytes(&bytes), identifier);
    }

    /// Property: Tuples keep their JSON field names for any content
    #[test]
    fn prop_tuple_json_shape(
        epoch_id in epoch_strategy(),
        ebid in ebid_strategy(),
        ecc in any::<u8>()
    ) {
        let tuple = EphemeralTuple::new(epoch_id, ebid, Ecc::from_byte(ecc));
        let json: serde_json::Value = serde_json::to_value(tuple).unwrap();

        prop_assert_eq!(json["epochId"].as_i64(), Some(i64::from(epoch_id)));
        let expected = ebid.to_base64();
        prop_assert_eq!(json["key"]["ebid"].as_str(), Some(expected.as_str()));
        let restored: EphemeralTuple = serde_json::from_value(json).unwrap();
        prop_assert_eq!(restored, tuple);
    }
}

// ============================================================
// Clock
// ============================================================

proptest! {
    /// Property: Every second of an epoch maps back to that epoch
    #[test]
    fn prop_epoch_contains_its_seconds(epoch_id in 0i32..2_000_000, offset in 0i64..900) {
        let instant = clock().at_epoch(epoch_id).plus(TimeDelta::seconds(offset)).unwrap();
        prop_assert_eq!(instant.as_epoch_id(), epoch_id);
    }

    /// Property: An instant is rebuilt from its own 16 low NTP bits
    #[test]
    fn prop_ntp16_lsb_is_stable(epoch_id in 0i32..500_000, offset in 0i64..900) {
        let instant = clock().at_epoch(epoch_id).plus(TimeDelta::seconds(offset)).unwrap();
        let rebuilt = instant.with_ntp16_lsb(instant.as_16_lsb_of_ntp()).unwrap();
        prop_assert_eq!(rebuilt.as_ntp_timestamp(), instant.as_ntp_timestamp());
    }

    /// Property: A nearby instant recovers the send time within half the window
    #[test]
    fn prop_ntp16_lsb_recovers_nearby_time(
        epoch_id in 1_000i32..500_000,
        drift in -30_000i64..30_000
    ) {
        let sent = clock().at_epoch(epoch_id);
        let received = sent.plus(TimeDelta::seconds(drift)).unwrap();
        let rebuilt = received.with_ntp16_lsb(sent.as_16_lsb_of_ntp()).unwrap();
        prop_assert_eq!(rebuilt.as_ntp_timestamp(), sent.as_ntp_timestamp());
    }
}

// ============================================================
// Request MACs
// ============================================================

proptest! {
    /// Property: Credential MACs bind the request type
    #[test]
    fn prop_credential_mac_binds_request_type(
        key in prop::array::uniform32(any::<u8>()),
        ebid in ebid_strategy(),
        epoch_id in epoch_strategy()
    ) {
        let key = SymmetricKey::from_slice(&key);
        let time = clock().at_epoch(epoch_id);
        let status = Credentials::compute_mac(&key, RequestType::Status, &ebid, epoch_id, &time);
        let unregister =
            Credentials::compute_mac(&key, RequestType::Unregister, &ebid, epoch_id, &time);

        prop_assert_eq!(
            Credentials::compute_mac(&key, RequestType::Status, &ebid, epoch_id, &time),
            status
        );
        prop_assert_ne!(status, unregister);
    }
}
