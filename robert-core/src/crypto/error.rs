// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Block cipher error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid block size: expected {expected} bytes, got {actual}")]
    InvalidBlockSize { expected: usize, actual: usize },
    #[error("Invalid key size: {0} bytes")]
    InvalidKeySize(usize),
}
