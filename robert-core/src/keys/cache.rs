// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Keystore-backed key repository.
//!
//! Keys live in an immutable snapshot behind an `Arc`. Lazy loads and
//! reloads build a new snapshot and swap the pointer, so readers never
//! observe a partially updated cache. A lazy load only fills an alias the
//! current snapshot lacks; it never replaces a value installed by a reload
//! that completed while the keystore was being read.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::crypto::{ServerKeyPair, SymmetricKey};
use crate::storage::Keystore;

use super::{
    parse_server_key_alias, server_key_alias, KeyError, KeyRepository, FEDERATION_KEY_ALIAS,
    KEY_ENCRYPTION_KEY_ALIAS, REGISTER_KEY_ALIAS, SERVER_KEY_LEN,
};

#[derive(Clone, Default)]
struct KeySnapshot {
    keys: BTreeMap<String, SymmetricKey>,
    register_key: Option<ServerKeyPair>,
}

/// [`KeyRepository`] caching keys read from a [`Keystore`].
pub struct KeystoreKeyRepository {
    keystore: Arc<dyn Keystore>,
    pin: RwLock<String>,
    snapshot: RwLock<Arc<KeySnapshot>>,
}

impl KeystoreKeyRepository {
    /// Creates an empty cache; keys are loaded on first use.
    pub fn new(keystore: Arc<dyn Keystore>, pin: impl Into<String>) -> Self {
        Self {
            keystore,
            pin: RwLock::new(pin.into()),
            snapshot: RwLock::new(Arc::new(KeySnapshot::default())),
        }
    }

    fn snapshot(&self) -> Arc<KeySnapshot> {
        // Writers only ever assign a complete Arc, so a poisoned lock still
        // holds a consistent snapshot.
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update<R>(&self, change: impl FnOnce(&mut KeySnapshot) -> R) -> R {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = KeySnapshot::clone(&guard);
        let result = change(&mut next);
        *guard = Arc::new(next);
        result
    }

    fn current_pin(&self) -> String {
        self.pin
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn read_keystore(&self, alias: &str, pin: &str) -> Result<Option<Vec<u8>>, KeyError> {
        debug!(alias, "loading key from keystore");
        let key = self.keystore.load_key(alias, pin)?;
        if key.is_none() {
            error!(alias, "keystore does not contain key");
        }
        Ok(key)
    }

    fn symmetric_key(&self, alias: &str) -> Result<Option<SymmetricKey>, KeyError> {
        if let Some(key) = self.snapshot().keys.get(alias) {
            return Ok(Some(key.clone()));
        }

        let Some(bytes) = self.read_keystore(alias, &self.current_pin())? else {
            return Ok(None);
        };
        let key = SymmetricKey::from_slice(&bytes);
        let cached = self.update(|snapshot| {
            snapshot
                .keys
                .entry(alias.to_string())
                .or_insert(key)
                .clone()
        });
        Ok(Some(cached))
    }

    fn required_key(&self, alias: &str) -> Result<SymmetricKey, KeyError> {
        self.symmetric_key(alias)?
            .ok_or_else(|| KeyError::MissingKeyMaterial(alias.to_string()))
    }
}

fn check_server_key(alias: &str, key: &[u8]) -> Result<(), KeyError> {
    if key.len() != SERVER_KEY_LEN {
        return Err(KeyError::InvalidKeyMaterial {
            alias: alias.to_string(),
            reason: format!("expected {} bytes, got {}", SERVER_KEY_LEN, key.len()),
        });
    }
    Ok(())
}

fn parse_register_key(bytes: &[u8]) -> Result<ServerKeyPair, KeyError> {
    ServerKeyPair::from_private_bytes(bytes).map_err(|e| KeyError::InvalidKeyMaterial {
        alias: REGISTER_KEY_ALIAS.to_string(),
        reason: e.to_string(),
    })
}

/// Dates between the oldest and newest key that have no key.
fn missing_dates(dates: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|date| date <= last)
        .filter(|date| !dates.contains(date))
        .collect()
}

impl KeyRepository for KeystoreKeyRepository {
    fn get_server_key(&self, date: NaiveDate) -> Option<SymmetricKey> {
        let alias = server_key_alias(date);
        let key = match self.symmetric_key(&alias) {
            Ok(key) => key?,
            Err(e) => {
                error!(alias = %alias, error = %e, "unable to load server key");
                return None;
            }
        };
        match check_server_key(&alias, key.as_bytes()) {
            Ok(()) => Some(key),
            Err(e) => {
                error!(error = %e, "ignoring server key");
                None
            }
        }
    }

    fn get_federation_key(&self) -> Result<SymmetricKey, KeyError> {
        self.required_key(FEDERATION_KEY_ALIAS)
    }

    fn get_key_encryption_key(&self) -> Result<SymmetricKey, KeyError> {
        self.required_key(KEY_ENCRYPTION_KEY_ALIAS)
    }

    fn get_server_keypair(&self) -> Result<ServerKeyPair, KeyError> {
        if let Some(pair) = &self.snapshot().register_key {
            return Ok(pair.clone());
        }

        let bytes = self
            .read_keystore(REGISTER_KEY_ALIAS, &self.current_pin())?
            .ok_or_else(|| KeyError::MissingKeyMaterial(REGISTER_KEY_ALIAS.to_string()))?;
        let pair = parse_register_key(&bytes)?;
        Ok(self.update(|snapshot| snapshot.register_key.get_or_insert(pair).clone()))
    }

    fn reload(&self, pin: &str) -> Result<(), KeyError> {
        let mut next = KeySnapshot::default();

        for alias in [FEDERATION_KEY_ALIAS, KEY_ENCRYPTION_KEY_ALIAS] {
            if let Some(bytes) = self.read_keystore(alias, pin)? {
                next.keys
                    .insert(alias.to_string(), SymmetricKey::from_slice(&bytes));
            }
        }

        if let Some(bytes) = self.read_keystore(REGISTER_KEY_ALIAS, pin)? {
            next.register_key = Some(parse_register_key(&bytes)?);
        }

        let mut dates = BTreeSet::new();
        for alias in self.keystore.aliases()? {
            let Some(date) = parse_server_key_alias(&alias) else {
                continue;
            };
            let Some(bytes) = self.read_keystore(&alias, pin)? else {
                continue;
            };
            if let Err(e) = check_server_key(&alias, &bytes) {
                error!(error = %e, "ignoring server key");
                continue;
            }
            next.keys.insert(alias, SymmetricKey::from_slice(&bytes));
            dates.insert(date);
        }

        let missing = missing_dates(&dates);
        if !missing.is_empty() {
            let missing: Vec<String> = missing.iter().map(NaiveDate::to_string).collect();
            warn!(
                count = missing.len(),
                dates = %missing.join(", "),
                "server keys are missing between the oldest and newest key"
            );
        }

        let cached = next.keys.len() + usize::from(next.register_key.is_some());
        *self.pin.write().unwrap_or_else(PoisonError::into_inner) = pin.to_string();
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        info!(
            cached,
            server_keys = dates.len(),
            first = ?dates.first(),
            last = ?dates.last(),
            "keys reloaded"
        );
        Ok(())
    }

    fn cached_key_names(&self) -> BTreeSet<String> {
        let snapshot = self.snapshot();
        let mut names: BTreeSet<String> = snapshot.keys.keys().cloned().collect();
        if snapshot.register_key.is_some() {
            names.insert(REGISTER_KEY_ALIAS.to_string());
        }
        names
    }
}
