// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! Encrypted identity keys in SQLite and the PIN-protected keystore holding
//! server key material.

mod error;
mod identity;

pub mod migration;
pub mod secure;

pub use error::StorageError;
pub use identity::{EncryptedIdentity, IdentityStore, MemoryIdentityStore};
pub use secure::{FileKeystore, Keystore, MemoryKeystore};

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-based identity storage.
///
/// Rows only ever hold key material encrypted under the key-encryption key.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Storage {
            conn: Mutex::new(conn),
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Creates an in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage {
            conn: Mutex::new(conn),
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Runs all pending schema migrations.
    fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        migration::migrate(&conn, migration::MIGRATIONS)?;
        Ok(())
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        let conn = self.conn()?;
        migration::schema_version(&conn)
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}
