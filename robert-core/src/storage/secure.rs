// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Keystore Module
//!
//! Backing storage for server key material, addressed by alias
//! (`federation-key`, `key-encryption-key`, `register-key`,
//! `server-key-yyyyMMdd`). Every read is authorized by the keystore PIN.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

use crate::crypto::password_kdf::{derive_key_pbkdf2, PBKDF2_ITERATIONS};
use crate::crypto::SymmetricKey;
use crate::storage::StorageError;

/// Trait for PIN-protected storage of cryptographic keys.
pub trait Keystore: Send + Sync {
    /// Saves a key under `alias`, replacing any previous value.
    fn save_key(&self, alias: &str, key: &[u8], pin: &str) -> Result<(), StorageError>;

    /// Loads a key. Returns None if the alias doesn't exist.
    fn load_key(&self, alias: &str, pin: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Deletes a key. Deleting a missing alias is not an error.
    fn delete_key(&self, alias: &str) -> Result<(), StorageError>;

    /// Lists every alias currently present, sorted.
    fn aliases(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory keystore guarded by a fixed PIN.
pub struct MemoryKeystore {
    pin: String,
    keys: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKeystore {
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            keys: RwLock::new(BTreeMap::new()),
        }
    }

    fn check_pin(&self, pin: &str) -> Result<(), StorageError> {
        let expected = digest::digest(&digest::SHA256, self.pin.as_bytes());
        let actual = digest::digest(&digest::SHA256, pin.as_bytes());
        if expected.as_ref() != actual.as_ref() {
            return Err(StorageError::Encryption("Invalid keystore PIN".to_string()));
        }
        Ok(())
    }
}

impl Keystore for MemoryKeystore {
    fn save_key(&self, alias: &str, key: &[u8], pin: &str) -> Result<(), StorageError> {
        self.check_pin(pin)?;
        self.keys
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(alias.to_string(), key.to_vec());
        Ok(())
    }

    fn load_key(&self, alias: &str, pin: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.check_pin(pin)?;
        let keys = self.keys.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(keys.get(alias).cloned())
    }

    fn delete_key(&self, alias: &str) -> Result<(), StorageError> {
        self.keys
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(alias);
        Ok(())
    }

    fn aliases(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.keys.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(keys.keys().cloned().collect())
    }
}

/// Name of the file holding the PBKDF2 salt of a file keystore.
const SALT_FILE: &str = "keystore.salt";
const KEY_EXTENSION: &str = "key";
const SALT_LEN: usize = 16;

/// File-based keystore.
///
/// Each alias is one `<alias>.key` file encrypted with AES-256-GCM under a
/// wrapping key derived from the PIN with PBKDF2-HMAC-SHA256. The salt is
/// created with the first saved key.
pub struct FileKeystore {
    path: PathBuf,
    iterations: u32,
    // (SHA-256 of the PIN, wrapping key) of the last PIN used
    unlocked: Mutex<Option<(Vec<u8>, SymmetricKey)>>,
}

impl FileKeystore {
    /// Creates a file keystore rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_iterations(path, PBKDF2_ITERATIONS)
    }

    /// Creates a file keystore with a custom PBKDF2 iteration count.
    pub fn with_iterations(path: impl Into<PathBuf>, iterations: u32) -> Self {
        Self {
            path: path.into(),
            iterations,
            unlocked: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn key_file_path(&self, alias: &str) -> PathBuf {
        // Sanitize the alias to prevent path traversal
        let safe_alias = alias
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        self.path.join(format!("{}.{}", safe_alias, KEY_EXTENSION))
    }

    fn salt(&self, create: bool) -> Result<Option<Vec<u8>>, StorageError> {
        let salt_path = self.path.join(SALT_FILE);
        if salt_path.exists() {
            return Ok(Some(std::fs::read(&salt_path)?));
        }
        if !create {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.path)?;
        let mut salt = vec![0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| StorageError::Encryption("System RNG failed".to_string()))?;
        std::fs::write(&salt_path, &salt)?;
        Ok(Some(salt))
    }

    fn wrapping_key(&self, pin: &str, salt: &[u8]) -> Result<SymmetricKey, StorageError> {
        let pin_digest = digest::digest(&digest::SHA256, pin.as_bytes());
        let mut unlocked = self
            .unlocked
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;

        if let Some((cached_digest, key)) = unlocked.as_ref() {
            if cached_digest.as_slice() == pin_digest.as_ref() {
                return Ok(key.clone());
            }
        }

        let key = derive_key_pbkdf2(pin.as_bytes(), salt, self.iterations)
            .map_err(|e| StorageError::Encryption(e.to_string()))?;
        *unlocked = Some((pin_digest.as_ref().to_vec(), key.clone()));
        Ok(key)
    }
}

impl Keystore for FileKeystore {
    fn save_key(&self, alias: &str, key: &[u8], pin: &str) -> Result<(), StorageError> {
        let salt = self
            .salt(true)?
            .ok_or_else(|| StorageError::Encryption("Missing keystore salt".to_string()))?;
        let wrapping_key = self.wrapping_key(pin, &salt)?;

        let encrypted = crate::crypto::encrypt(&wrapping_key, key)
            .map_err(|e| StorageError::Encryption(format!("Encryption failed: {}", e)))?;

        std::fs::write(self.key_file_path(alias), &encrypted)?;
        Ok(())
    }

    fn load_key(&self, alias: &str, pin: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let file_path = self.key_file_path(alias);
        if !file_path.exists() {
            return Ok(None);
        }

        let salt = self
            .salt(false)?
            .ok_or_else(|| StorageError::Encryption("Missing keystore salt".to_string()))?;
        let wrapping_key = self.wrapping_key(pin, &salt)?;

        let encrypted = std::fs::read(&file_path)?;
        let key = crate::crypto::decrypt(&wrapping_key, &encrypted).map_err(|e| {
            StorageError::Encryption(format!("Cannot unlock '{}': {}", alias, e))
        })?;

        Ok(Some(key))
    }

    fn delete_key(&self, alias: &str) -> Result<(), StorageError> {
        let file_path = self.key_file_path(alias);
        if file_path.exists() {
            std::fs::remove_file(&file_path)?;
        }
        Ok(())
    }

    fn aliases(&self) -> Result<Vec<String>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut aliases = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                aliases.push(stem.to_string());
            }
        }
        aliases.sort();
        Ok(aliases)
    }
}
