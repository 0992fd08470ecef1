// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod aes_ecb;
pub mod ecdh;
pub mod encryption;
mod error;
pub mod mac;
pub mod password_kdf;
pub mod skinny64;

pub use aes_ecb::{aes_ecb_decrypt, aes_ecb_encrypt};
pub use ecdh::{
    derive_secret_keys, encode_public_key, parse_client_public_key, DerivedKeys, SecretKeyError,
    ServerKeyPair,
};
pub use encryption::{decrypt, encrypt, EncryptionError, SymmetricKey};
pub use error::CipherError;
pub use mac::{hmac_sha256, verify_hmac_sha256, HMAC_SHA256_LEN};
pub use password_kdf::{derive_key_pbkdf2, PasswordKdfError};
pub use skinny64::{skinny64_decrypt, skinny64_encrypt, Skinny64};
