// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity storage operations.
//!
//! Identities are stored with both derived keys encrypted under the
//! key-encryption key; this layer never sees plaintext key material.

use std::collections::HashMap;
use std::sync::RwLock;

use rusqlite::{params, ErrorCode};

use crate::model::IdA;

use super::{Storage, StorageError};

/// Identity row as persisted: idA and the two KEK-encrypted keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedIdentity {
    pub id_a: IdA,
    pub key_for_mac_encrypted: Vec<u8>,
    pub key_for_tuples_encrypted: Vec<u8>,
}

/// Per-idA store of encrypted identity keys.
pub trait IdentityStore: Send + Sync {
    /// Persists a new identity. Fails with `AlreadyExists` on an idA collision.
    fn save(&self, identity: &EncryptedIdentity) -> Result<(), StorageError>;

    /// Returns None if the idA is unknown.
    fn find(&self, id_a: &IdA) -> Result<Option<EncryptedIdentity>, StorageError>;

    /// Removes an identity. Deleting an unknown idA is not an error.
    fn delete(&self, id_a: &IdA) -> Result<(), StorageError>;

    fn count(&self) -> Result<u64, StorageError>;

    fn exists(&self, id_a: &IdA) -> Result<bool, StorageError> {
        Ok(self.find(id_a)?.is_some())
    }
}

impl IdentityStore for Storage {
    fn save(&self, identity: &EncryptedIdentity) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let now = chrono::Utc::now().timestamp();

        let result = conn.execute(
            "INSERT INTO identity (id_a, key_for_mac_encrypted, key_for_tuples_encrypted, creation_time, last_update)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                identity.id_a.as_bytes().as_slice(),
                identity.key_for_mac_encrypted,
                identity.key_for_tuples_encrypted,
                now
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::AlreadyExists(identity.id_a.to_string()))
            }
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    fn find(&self, id_a: &IdA) -> Result<Option<EncryptedIdentity>, StorageError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT key_for_mac_encrypted, key_for_tuples_encrypted FROM identity WHERE id_a = ?1",
            params![id_a.as_bytes().as_slice()],
            |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?)),
        );

        match result {
            Ok((key_for_mac_encrypted, key_for_tuples_encrypted)) => Ok(Some(EncryptedIdentity {
                id_a: *id_a,
                key_for_mac_encrypted,
                key_for_tuples_encrypted,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    fn delete(&self, id_a: &IdA) -> Result<(), StorageError> {
        self.conn()?.execute(
            "DELETE FROM identity WHERE id_a = ?1",
            params![id_a.as_bytes().as_slice()],
        )?;
        Ok(())
    }

    fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM identity", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

/// Identity store held in memory.
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<IdA, EncryptedIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn save(&self, identity: &EncryptedIdentity) -> Result<(), StorageError> {
        let mut identities = self
            .identities
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if identities.contains_key(&identity.id_a) {
            return Err(StorageError::AlreadyExists(identity.id_a.to_string()));
        }
        identities.insert(identity.id_a, identity.clone());
        Ok(())
    }

    fn find(&self, id_a: &IdA) -> Result<Option<EncryptedIdentity>, StorageError> {
        let identities = self
            .identities
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(identities.get(id_a).cloned())
    }

    fn delete(&self, id_a: &IdA) -> Result<(), StorageError> {
        self.identities
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(id_a);
        Ok(())
    }

    fn count(&self) -> Result<u64, StorageError> {
        let identities = self
            .identities
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(identities.len() as u64)
    }
}
