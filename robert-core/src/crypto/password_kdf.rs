// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Keystore PIN Derivation
//!
//! The file keystore wraps every stored key with a 256-bit key derived from
//! the operator PIN using PBKDF2-HMAC-SHA256.

use ring::pbkdf2;
use std::num::NonZeroU32;
use zeroize::Zeroize;

use super::SymmetricKey;

/// PBKDF2 iterations for keystore wrapping keys.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derives a 32-byte symmetric key from a PIN using PBKDF2-HMAC-SHA256.
pub fn derive_key_pbkdf2(
    pin: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<SymmetricKey, PasswordKdfError> {
    let mut key_bytes = [0u8; 32];

    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(iterations).ok_or(PasswordKdfError::DerivationFailed(
            "iterations must be non-zero".into(),
        ))?,
        salt,
        pin,
        &mut key_bytes,
    );

    let key = SymmetricKey::from_slice(&key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

/// PIN KDF error types.
#[derive(Debug, thiserror::Error)]
pub enum PasswordKdfError {
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(derive_key_pbkdf2(b"pin", b"salt", 0).is_err());
    }

    #[test]
    fn test_same_pin_and_salt_are_deterministic() {
        let a = derive_key_pbkdf2(b"1234", b"salt", 10).unwrap();
        let b = derive_key_pbkdf2(b"1234", b"salt", 10).unwrap();
        let c = derive_key_pbkdf2(b"4321", b"salt", 10).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
