// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity lifecycle: registration, request authentication, tuples bundles
//! and deletion.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::RobertClock;
use crate::crypto::{derive_secret_keys, encrypt, parse_client_public_key, SecretKeyError};
use crate::keys::KeyRepository;
use crate::model::{CountryCode, Credentials, EphemeralTuple, IdA};
use crate::storage::{IdentityStore, StorageError};
use crate::tuples::TuplesGenerator;

use super::{Identity, IdentityError};

/// Attempts at drawing an unused idA before giving up.
const MAX_ID_A_ATTEMPTS: usize = 5;

/// Creates, authenticates and deletes application identities.
pub struct IdentityService {
    clock: RobertClock,
    keys: Arc<dyn KeyRepository>,
    store: Arc<dyn IdentityStore>,
}

impl IdentityService {
    pub fn new(
        clock: RobertClock,
        keys: Arc<dyn KeyRepository>,
        store: Arc<dyn IdentityStore>,
    ) -> Self {
        IdentityService { clock, keys, store }
    }

    /// Registers a new application from its X.509 encoded P-256 public key.
    pub fn create_identity(&self, raw_client_public_key: &[u8]) -> Result<Identity, IdentityError> {
        let client_public_key = parse_client_public_key(raw_client_public_key)
            .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;

        let server_key_pair = self.keys.get_server_keypair()?;
        let derived = derive_secret_keys(&server_key_pair, &client_public_key).map_err(|e| {
            match e {
                SecretKeyError::InvalidClientKey(reason) => IdentityError::InvalidPublicKey(reason),
                other => IdentityError::KeyDerivationFailed(other.to_string()),
            }
        })?;

        let kek = self.keys.get_key_encryption_key()?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            let identity = Identity::new(
                IdA::generate(),
                derived.key_for_mac.clone(),
                derived.key_for_tuples.clone(),
            );
            match self.store.save(&identity.encrypt(&kek)?) {
                Ok(()) => {
                    debug!(id_a = %identity.id_a(), "identity created");
                    return Ok(identity);
                }
                Err(StorageError::AlreadyExists(id_a)) if attempts < MAX_ID_A_ATTEMPTS => {
                    warn!(id_a = %id_a, attempts, "idA collision, drawing a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolves the identity that produced `credentials` and checks its MAC.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<Identity, IdentityError> {
        let date = self.clock.at_epoch(credentials.epoch_id).utc_date();
        let server_key = self
            .keys
            .get_server_key(date)
            .ok_or(IdentityError::MissingServerKey(date))?;

        let bluetooth_identifier = credentials.ebid.decrypt(&server_key)?;
        if bluetooth_identifier.epoch_id != credentials.epoch_id {
            return Err(IdentityError::EbidEpochMismatch {
                request_epoch: credentials.epoch_id,
                ebid_epoch: bluetooth_identifier.epoch_id,
            });
        }

        let identity = self
            .find(&bluetooth_identifier.id_a)?
            .ok_or(IdentityError::UnknownIdentity(bluetooth_identifier.id_a))?;

        if !credentials.has_valid_checksum(identity.key_for_mac()) {
            return Err(IdentityError::InvalidMac);
        }

        Ok(identity)
    }

    /// Loads and decrypts an identity, None if the idA is unknown.
    pub fn find(&self, id_a: &IdA) -> Result<Option<Identity>, IdentityError> {
        let Some(record) = self.store.find(id_a)? else {
            return Ok(None);
        };
        let kek = self.keys.get_key_encryption_key()?;
        Ok(Some(Identity::decrypt(&record, &kek)?))
    }

    /// Tuples from `start_epoch_id` until the end of the day
    /// `bundle_days - 1` days later.
    pub fn generate_tuples(
        &self,
        identity: &Identity,
        country_code: CountryCode,
        start_epoch_id: i32,
        bundle_days: u32,
    ) -> Result<Vec<EphemeralTuple>, IdentityError> {
        let begin = self.clock.at_epoch(start_epoch_id);
        let end = begin.truncated_to_day().plus_days(i64::from(bundle_days))?;
        let epochs: Vec<_> = begin.epochs_until(&end).collect();

        let tuples = TuplesGenerator::new(country_code, *identity.id_a(), self.keys.as_ref())
            .generate(&epochs)?;
        if tuples.is_empty() {
            return Err(IdentityError::NoTuplesGenerated);
        }
        Ok(tuples)
    }

    /// Generates tuples and encrypts their JSON form with the identity's
    /// tuples key.
    pub fn generate_encrypted_tuples_bundle(
        &self,
        identity: &Identity,
        country_code: CountryCode,
        start_epoch_id: i32,
        bundle_days: u32,
    ) -> Result<Vec<u8>, IdentityError> {
        let tuples = self.generate_tuples(identity, country_code, start_epoch_id, bundle_days)?;
        let json = serde_json::to_vec(&tuples)?;
        Ok(encrypt(identity.key_for_tuples(), &json)?)
    }

    /// Deletes an identity. Unknown idAs are ignored.
    pub fn delete(&self, id_a: &IdA) -> Result<(), IdentityError> {
        self.store.delete(id_a)?;
        debug!(id_a = %id_a, "identity deleted");
        Ok(())
    }
}
