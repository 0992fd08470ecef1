// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;

use robert_core::model::{BluetoothIdentifier, Ebid, IdA};

/// Strategy for 5-byte application identifiers.
pub fn id_a_strategy() -> impl Strategy<Value = IdA> {
    prop::array::uniform5(any::<u8>()).prop_map(IdA::from_bytes)
}

/// Strategy for epoch ids that fit the 24-bit field.
pub fn epoch_strategy() -> impl Strategy<Value = i32> {
    0..=BluetoothIdentifier::MAX_EPOCH_ID
}

pub fn bluetooth_identifier_strategy() -> impl Strategy<Value = BluetoothIdentifier> {
    (epoch_strategy(), id_a_strategy())
        .prop_map(|(epoch_id, id_a)| BluetoothIdentifier::new(epoch_id, id_a))
}

/// Strategy for 192-bit server keys.
pub fn server_key_strategy() -> impl Strategy<Value = [u8; 24]> {
    prop::array::uniform24(any::<u8>())
}

pub fn ebid_strategy() -> impl Strategy<Value = Ebid> {
    prop::array::uniform8(any::<u8>()).prop_map(Ebid::from_bytes)
}
