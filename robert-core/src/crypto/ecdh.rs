// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Secret Key Derivation (ECDH P-256)
//!
//! Client applications send an X.509 SubjectPublicKeyInfo encoded secp256r1
//! public key at registration. The server agrees on a shared secret with its
//! `register-key` pair and derives two 256-bit keys from it:
//!
//! - `keyForMac = HMAC-SHA256(shared, "mac")`
//! - `keyForTuples = HMAC-SHA256(shared, "tuples")`

use p256::ecdh::diffie_hellman;
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::Zeroizing;

use super::mac::hmac_sha256;
use super::SymmetricKey;

const MAC_KEY_LABEL: &[u8] = b"mac";
const TUPLES_KEY_LABEL: &[u8] = b"tuples";

/// Key agreement error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretKeyError {
    #[error("Invalid client public key: {0}")]
    InvalidClientKey(String),
    #[error("Key agreement failed: {0}")]
    KeyAgreementFailure(String),
    #[error("Invalid server key pair: {0}")]
    InvalidServerKey(String),
}

/// Server ECDH registration key pair.
#[derive(Clone)]
pub struct ServerKeyPair {
    secret: SecretKey,
}

impl std::fmt::Debug for ServerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerKeyPair")
            .field("public", &self.secret.public_key())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl ServerKeyPair {
    /// Generates a new random key pair.
    pub fn generate() -> Self {
        ServerKeyPair {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    /// Restores a key pair from its 32-byte private scalar.
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self, SecretKeyError> {
        SecretKey::from_slice(bytes)
            .map(|secret| ServerKeyPair { secret })
            .map_err(|e| SecretKeyError::InvalidServerKey(e.to_string()))
    }

    /// Returns the 32-byte private scalar.
    pub fn private_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.secret.to_bytes().to_vec())
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// Returns the public key as X.509 SubjectPublicKeyInfo DER.
    pub fn public_key_der(&self) -> Result<Vec<u8>, SecretKeyError> {
        encode_public_key(&self.public_key())
    }
}

/// Keys derived for one registered application.
pub struct DerivedKeys {
    pub key_for_mac: SymmetricKey,
    pub key_for_tuples: SymmetricKey,
}

/// Parses an X.509 SubjectPublicKeyInfo DER encoded P-256 public key.
pub fn parse_client_public_key(der: &[u8]) -> Result<PublicKey, SecretKeyError> {
    PublicKey::from_public_key_der(der)
        .map_err(|e| SecretKeyError::InvalidClientKey(e.to_string()))
}

/// Encodes a P-256 public key as X.509 SubjectPublicKeyInfo DER.
pub fn encode_public_key(public_key: &PublicKey) -> Result<Vec<u8>, SecretKeyError> {
    public_key
        .to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| SecretKeyError::InvalidClientKey(e.to_string()))
}

/// Agrees on a shared secret with the client key and derives the MAC and
/// tuples keys from it.
pub fn derive_secret_keys(
    server: &ServerKeyPair,
    client_public_key: &PublicKey,
) -> Result<DerivedKeys, SecretKeyError> {
    let shared = diffie_hellman(server.secret.to_nonzero_scalar(), client_public_key.as_affine());
    let shared_bytes = Zeroizing::new(shared.raw_secret_bytes().to_vec());

    if shared_bytes.iter().all(|b| *b == 0) {
        return Err(SecretKeyError::KeyAgreementFailure(
            "degenerate shared secret".to_string(),
        ));
    }

    Ok(DerivedKeys {
        key_for_mac: SymmetricKey::from_slice(&hmac_sha256(&shared_bytes, &[MAC_KEY_LABEL])),
        key_for_tuples: SymmetricKey::from_slice(&hmac_sha256(
            &shared_bytes,
            &[TUPLES_KEY_LABEL],
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_sides_derive_same_keys() {
        let server = ServerKeyPair::generate();
        let client = ServerKeyPair::generate();

        let server_side = derive_secret_keys(&server, &client.public_key()).unwrap();
        let client_side = derive_secret_keys(&client, &server.public_key()).unwrap();

        assert_eq!(
            server_side.key_for_mac.as_bytes(),
            client_side.key_for_mac.as_bytes()
        );
        assert_eq!(
            server_side.key_for_tuples.as_bytes(),
            client_side.key_for_tuples.as_bytes()
        );
        assert_ne!(
            server_side.key_for_mac.as_bytes(),
            server_side.key_for_tuples.as_bytes()
        );
    }

    #[test]
    fn test_public_key_der_roundtrip() {
        let pair = ServerKeyPair::generate();
        let der = pair.public_key_der().unwrap();
        assert_eq!(parse_client_public_key(&der).unwrap(), pair.public_key());
    }

    #[test]
    fn test_garbage_public_key_is_rejected() {
        let result = parse_client_public_key(b"not a key");
        assert!(matches!(result, Err(SecretKeyError::InvalidClientKey(_))));
    }

    #[test]
    fn test_private_bytes_restore_same_pair() {
        let pair = ServerKeyPair::generate();
        let restored = ServerKeyPair::from_private_bytes(&pair.private_bytes()).unwrap();
        assert_eq!(restored.public_key(), pair.public_key());
    }
}
