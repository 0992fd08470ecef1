// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Skinny-64-192 Block Cipher
//!
//! Lightweight tweakable block cipher with a 64-bit block and a 192-bit
//! tweakey, used without tweak to encrypt 8-byte Bluetooth identifiers.
//!
//! The state and the three tweakey words are held as 16 nibbles each, high
//! nibble of every byte first. Round keys are expanded once per key.

use super::CipherError;

/// Block size in bytes.
pub const BLOCK_SIZE: usize = 8;
/// Key size in bytes (TK1 || TK2 || TK3).
pub const KEY_SIZE: usize = 24;

const ROUNDS: usize = 40;

const SBOX: [u8; 16] = [12, 6, 9, 0, 1, 10, 2, 11, 3, 8, 5, 13, 4, 14, 7, 15];
const SBOX_INV: [u8; 16] = [3, 4, 6, 8, 12, 10, 1, 14, 9, 2, 5, 7, 0, 11, 13, 15];

const ROUND_CONSTANTS: [u8; ROUNDS] = [
    0x01, 0x03, 0x07, 0x0F, 0x1F, 0x3E, 0x3D, 0x3B, 0x37, 0x2F, 0x1E, 0x3C, 0x39, 0x33, 0x27,
    0x0E, 0x1D, 0x3A, 0x35, 0x2B, 0x16, 0x2C, 0x18, 0x30, 0x21, 0x02, 0x05, 0x0B, 0x17, 0x2E,
    0x1C, 0x38, 0x31, 0x23, 0x06, 0x0D, 0x1B, 0x36, 0x2D, 0x1A,
];

const TWEAKEY_PERMUTATION: [usize; 16] = [9, 15, 8, 13, 10, 14, 12, 11, 0, 1, 2, 3, 4, 5, 6, 7];
const SHIFT_ROWS: [usize; 16] = [0, 1, 2, 3, 7, 4, 5, 6, 10, 11, 8, 9, 13, 14, 15, 12];
const SHIFT_ROWS_INV: [usize; 16] = [0, 1, 2, 3, 5, 6, 7, 4, 10, 11, 8, 9, 15, 12, 13, 14];

type Nibbles = [u8; 16];

/// Expanded Skinny-64-192 key.
pub struct Skinny64 {
    round_keys: [[u8; 8]; ROUNDS],
}

impl std::fmt::Debug for Skinny64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skinny64")
            .field("round_keys", &"[REDACTED]")
            .finish()
    }
}

impl Drop for Skinny64 {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        for round_key in self.round_keys.iter_mut() {
            round_key.zeroize();
        }
    }
}

impl Skinny64 {
    /// Expands a 24-byte key.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_SIZE {
            return Err(CipherError::InvalidKeySize(key.len()));
        }

        let mut tk = [
            unpack(&key[0..8]),
            unpack(&key[8..16]),
            unpack(&key[16..24]),
        ];
        let mut round_keys = [[0u8; 8]; ROUNDS];

        for round_key in round_keys.iter_mut() {
            for (i, nibble) in round_key.iter_mut().enumerate() {
                *nibble = tk[0][i] ^ tk[1][i] ^ tk[2][i];
            }
            for word in tk.iter_mut() {
                *word = permute(word, &TWEAKEY_PERMUTATION);
            }
            for i in 0..8 {
                tk[1][i] = lfsr_tk2(tk[1][i]);
                tk[2][i] = lfsr_tk3(tk[2][i]);
            }
        }

        tk.iter_mut().for_each(|word| word.fill(0));
        Ok(Skinny64 { round_keys })
    }

    /// Encrypts exactly one 8-byte block.
    pub fn encrypt_block(&self, block: &[u8]) -> Result<[u8; BLOCK_SIZE], CipherError> {
        let mut state = unpack(check_block(block)?);

        for (round, round_key) in self.round_keys.iter().enumerate() {
            for nibble in state.iter_mut() {
                *nibble = SBOX[*nibble as usize];
            }
            add_constants(&mut state, ROUND_CONSTANTS[round]);
            for (nibble, key) in state.iter_mut().zip(round_key) {
                *nibble ^= key;
            }
            state = permute(&state, &SHIFT_ROWS);
            mix_columns(&mut state);
        }

        Ok(pack(&state))
    }

    /// Decrypts exactly one 8-byte block.
    pub fn decrypt_block(&self, block: &[u8]) -> Result<[u8; BLOCK_SIZE], CipherError> {
        let mut state = unpack(check_block(block)?);

        for (round, round_key) in self.round_keys.iter().enumerate().rev() {
            mix_columns_inv(&mut state);
            state = permute(&state, &SHIFT_ROWS_INV);
            for (nibble, key) in state.iter_mut().zip(round_key) {
                *nibble ^= key;
            }
            add_constants(&mut state, ROUND_CONSTANTS[round]);
            for nibble in state.iter_mut() {
                *nibble = SBOX_INV[*nibble as usize];
            }
        }

        Ok(pack(&state))
    }
}

/// Encrypts one 8-byte block with a 24-byte key.
pub fn skinny64_encrypt(key: &[u8], block: &[u8]) -> Result<[u8; BLOCK_SIZE], CipherError> {
    Skinny64::new(key)?.encrypt_block(block)
}

/// Decrypts one 8-byte block with a 24-byte key.
pub fn skinny64_decrypt(key: &[u8], block: &[u8]) -> Result<[u8; BLOCK_SIZE], CipherError> {
    Skinny64::new(key)?.decrypt_block(block)
}

fn check_block(block: &[u8]) -> Result<&[u8], CipherError> {
    if block.len() != BLOCK_SIZE {
        return Err(CipherError::InvalidBlockSize {
            expected: BLOCK_SIZE,
            actual: block.len(),
        });
    }
    Ok(block)
}

fn unpack(bytes: &[u8]) -> Nibbles {
    let mut nibbles = [0u8; 16];
    for (i, byte) in bytes.iter().take(8).enumerate() {
        nibbles[2 * i] = byte >> 4;
        nibbles[2 * i + 1] = byte & 0x0F;
    }
    nibbles
}

fn pack(nibbles: &Nibbles) -> [u8; BLOCK_SIZE] {
    let mut bytes = [0u8; BLOCK_SIZE];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = (nibbles[2 * i] << 4) | nibbles[2 * i + 1];
    }
    bytes
}

fn permute(nibbles: &Nibbles, permutation: &[usize; 16]) -> Nibbles {
    let mut out = [0u8; 16];
    for (slot, &from) in out.iter_mut().zip(permutation) {
        *slot = nibbles[from];
    }
    out
}

fn lfsr_tk2(x: u8) -> u8 {
    ((x << 1) & 0x0E) ^ ((x >> 3) & 1) ^ ((x >> 2) & 1)
}

fn lfsr_tk3(x: u8) -> u8 {
    ((x >> 1) & 0x07) ^ (x & 0x08) ^ ((x << 3) & 0x08)
}

fn add_constants(state: &mut Nibbles, constant: u8) {
    state[0] ^= constant & 0x0F;
    state[4] ^= (constant >> 4) & 0x03;
    state[8] ^= 0x02;
}

fn mix_columns(state: &mut Nibbles) {
    for j in 0..4 {
        state[4 + j] ^= state[8 + j];
        state[8 + j] ^= state[j];
        state[12 + j] ^= state[8 + j];

        let last = state[12 + j];
        state[12 + j] = state[8 + j];
        state[8 + j] = state[4 + j];
        state[4 + j] = state[j];
        state[j] = last;
    }
}

fn mix_columns_inv(state: &mut Nibbles) {
    for j in 0..4 {
        let first = state[j];
        state[j] = state[4 + j];
        state[4 + j] = state[8 + j];
        state[8 + j] = state[12 + j];
        state[12 + j] = first;

        state[12 + j] ^= state[8 + j];
        state[8 + j] ^= state[j];
        state[4 + j] ^= state[8 + j];
    }
}
