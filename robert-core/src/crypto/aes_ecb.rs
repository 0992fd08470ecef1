// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! AES in ECB mode, no padding.
//!
//! Only used to derive the one-block mask for encrypted country codes.
//! The AES variant follows the key length (16, 24 or 32 bytes).

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use super::CipherError;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

enum AesCipher {
    Aes128(Box<Aes128>),
    Aes192(Box<Aes192>),
    Aes256(Box<Aes256>),
}

impl AesCipher {
    fn new(key: &[u8]) -> Result<Self, CipherError> {
        let invalid = |_| CipherError::InvalidKeySize(key.len());
        match key.len() {
            16 => Ok(AesCipher::Aes128(Box::new(
                Aes128::new_from_slice(key).map_err(invalid)?,
            ))),
            24 => Ok(AesCipher::Aes192(Box::new(
                Aes192::new_from_slice(key).map_err(invalid)?,
            ))),
            32 => Ok(AesCipher::Aes256(Box::new(
                Aes256::new_from_slice(key).map_err(invalid)?,
            ))),
            other => Err(CipherError::InvalidKeySize(other)),
        }
    }

    fn encrypt(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            AesCipher::Aes128(c) => c.encrypt_block(block),
            AesCipher::Aes192(c) => c.encrypt_block(block),
            AesCipher::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            AesCipher::Aes128(c) => c.decrypt_block(block),
            AesCipher::Aes192(c) => c.decrypt_block(block),
            AesCipher::Aes256(c) => c.decrypt_block(block),
        }
    }
}

fn check_input(data: &[u8]) -> Result<(), CipherError> {
    if data.is_empty() || data.len() % AES_BLOCK_SIZE != 0 {
        return Err(CipherError::InvalidBlockSize {
            expected: AES_BLOCK_SIZE,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Encrypts a 16-byte-multiple input block by block.
pub fn aes_ecb_encrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_input(data)?;
    let cipher = AesCipher::new(key)?;
    let mut out = data.to_vec();
    for block in out.chunks_exact_mut(AES_BLOCK_SIZE) {
        cipher.encrypt(block);
    }
    Ok(out)
}

/// Decrypts a 16-byte-multiple input block by block.
pub fn aes_ecb_decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_input(data)?;
    let cipher = AesCipher::new(key)?;
    let mut out = data.to_vec();
    for block in out.chunks_exact_mut(AES_BLOCK_SIZE) {
        cipher.decrypt(block);
    }
    Ok(out)
}
