// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HMAC-SHA-256
//!
//! Used for request authentication codes, HelloMessage MACs (truncated) and
//! key derivation from the ECDH shared secret.

use ring::hmac;

/// HMAC-SHA-256 output length.
pub const HMAC_SHA256_LEN: usize = 32;

/// Computes HMAC-SHA-256 over the concatenation of `parts`.
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; HMAC_SHA256_LEN] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let mut context = hmac::Context::with_key(&key);
    for part in parts {
        context.update(part);
    }
    let mut out = [0u8; HMAC_SHA256_LEN];
    out.copy_from_slice(context.sign().as_ref());
    out
}

/// Checks `tag` against HMAC-SHA-256 over `parts` in constant time.
///
/// A `tag` shorter than the full output is compared against the same
/// number of leading bytes.
pub fn verify_hmac_sha256(key: &[u8], parts: &[&[u8]], tag: &[u8]) -> bool {
    if tag.is_empty() || tag.len() > HMAC_SHA256_LEN {
        return false;
    }
    let expected = hmac_sha256(key, parts);
    ring::constant_time::verify_slices_are_equal(&expected[..tag.len()], tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test case 2
    #[test]
    fn test_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", &[b"what do ya want ", b"for nothing?"]);
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_truncated_tag() {
        let mac = hmac_sha256(b"key", &[b"data"]);
        assert!(verify_hmac_sha256(b"key", &[b"data"], &mac[..5]));
        assert!(!verify_hmac_sha256(b"key", &[b"other"], &mac[..5]));
        assert!(!verify_hmac_sha256(b"key", &[b"data"], &[]));
    }
}
