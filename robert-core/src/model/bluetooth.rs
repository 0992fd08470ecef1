// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::crypto::{CipherError, Skinny64, SymmetricKey};

use super::{Ebid, IdA};

/// Plaintext Bluetooth identifier: 24-bit big-endian epoch id then idA.
///
/// ```text
/// +---------------------------------+
/// | epoch id (24 bits) | idA (40 bits)
/// +---------------------------------+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BluetoothIdentifier {
    pub epoch_id: i32,
    pub id_a: IdA,
}

impl BluetoothIdentifier {
    /// Largest epoch id that fits the 24-bit field.
    pub const MAX_EPOCH_ID: i32 = (1 << 24) - 1;

    pub fn new(epoch_id: i32, id_a: IdA) -> Self {
        BluetoothIdentifier { epoch_id, id_a }
    }

    /// Encodes the identifier; only the low 24 bits of the epoch id are kept.
    pub fn to_bytes(&self) -> [u8; 8] {
        let epoch = self.epoch_id.to_be_bytes();
        let mut bytes = [0u8; 8];
        bytes[..3].copy_from_slice(&epoch[1..]);
        bytes[3..].copy_from_slice(self.id_a.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 8]) -> Self {
        let epoch_id = i32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
        let mut id_a = [0u8; IdA::LEN];
        id_a.copy_from_slice(&bytes[3..]);
        BluetoothIdentifier {
            epoch_id,
            id_a: IdA::from_bytes(id_a),
        }
    }

    /// Encrypts with the 24-byte server key of the epoch's day.
    pub fn encrypt(&self, server_key: &SymmetricKey) -> Result<Ebid, CipherError> {
        let cipher = Skinny64::new(server_key.as_bytes())?;
        cipher.encrypt_block(&self.to_bytes()).map(Ebid::from_bytes)
    }
}
