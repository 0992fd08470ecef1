// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Storage error types.

use thiserror::Error;

/// Storage error types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}
