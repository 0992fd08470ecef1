// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric Keys and AES-256-GCM
//!
//! Key material of every role (federation, key-encryption, daily server keys,
//! derived per-identity keys) is carried as a [`SymmetricKey`].
//!
//! Authenticated encryption uses AES-256-GCM with a random IV.
//! Ciphertext format: `iv (12 bytes) || ciphertext || tag (16 bytes)`, the
//! layout deployed clients expect for tuples bundles.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroize;

/// Encryption error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed: data may be corrupted or wrong key")]
    DecryptionFailed,
    #[error("Ciphertext too short")]
    CiphertextTooShort,
    #[error("Invalid AES-256-GCM key length: {0}")]
    InvalidKeyLength(usize),
}

/// IV size for AES-256-GCM (96 bits = 12 bytes).
const AES_GCM_IV_SIZE: usize = 12;

/// Symmetric key of any length.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SymmetricKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SymmetricKey {
    /// Generates a new random 256-bit key.
    pub fn generate() -> Result<Self, EncryptionError> {
        Self::generate_with_len(32)
    }

    /// Generates a new random key of `len` bytes.
    pub fn generate_with_len(len: usize) -> Result<Self, EncryptionError> {
        let rng = SystemRandom::new();
        let mut bytes = vec![0u8; len];
        rng.fill(&mut bytes)
            .map_err(|_| EncryptionError::EncryptionFailed)?;
        Ok(SymmetricKey { bytes })
    }

    /// Creates a key by copying raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Self {
        SymmetricKey {
            bytes: bytes.to_vec(),
        }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn aes_256_gcm_key(key: &SymmetricKey) -> Result<LessSafeKey, EncryptionError> {
    let unbound_key = UnboundKey::new(&AES_256_GCM, key.as_bytes())
        .map_err(|_| EncryptionError::InvalidKeyLength(key.len()))?;
    Ok(LessSafeKey::new(unbound_key))
}

/// Encrypts data using AES-256-GCM.
///
/// Output format: `iv (12 bytes) || ciphertext || tag (16 bytes)`
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    let sealing_key = aes_256_gcm_key(key)?;
    let rng = SystemRandom::new();

    let mut iv = [0u8; AES_GCM_IV_SIZE];
    rng.fill(&mut iv)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let mut in_out = plaintext.to_vec();
    let nonce = Nonce::assume_unique_for_key(iv);
    sealing_key
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(AES_GCM_IV_SIZE + in_out.len());
    output.extend_from_slice(&iv);
    output.extend_from_slice(&in_out);

    Ok(output)
}

/// Decrypts AES-256-GCM data.
///
/// Input format: `iv (12 bytes) || ciphertext || tag (16 bytes)`
pub fn decrypt(key: &SymmetricKey, data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    let min_size = AES_GCM_IV_SIZE + AES_256_GCM.tag_len();
    if data.len() < min_size {
        return Err(EncryptionError::CiphertextTooShort);
    }
    let opening_key = aes_256_gcm_key(key)?;

    let iv: [u8; AES_GCM_IV_SIZE] = data[..AES_GCM_IV_SIZE]
        .try_into()
        .map_err(|_| EncryptionError::DecryptionFailed)?;
    let nonce = Nonce::assume_unique_for_key(iv);

    let mut buffer = data[AES_GCM_IV_SIZE..].to_vec();
    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut buffer)
        .map_err(|_| EncryptionError::DecryptionFailed)?;

    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key_bytes() {
        let key = SymmetricKey::from_slice(&[0xAA; 24]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("170"));
    }

    #[test]
    fn test_encrypt_rejects_short_key() {
        let key = SymmetricKey::from_slice(&[1u8; 24]);
        assert_eq!(
            encrypt(&key, b"data"),
            Err(EncryptionError::InvalidKeyLength(24))
        );
    }
}
