// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Crypto Server Facade
//!
//! Operations exposed to the transport layer. Each one validates its raw
//! inputs in a fixed order, runs the service and logs failures: caller
//! errors at info, internal errors at error.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info};

use crate::clock::RobertClock;
use crate::contact::{ContactValidationResult, HelloMessageValidator};
use crate::identity::IdentityService;
use crate::keys::{KeyRepository, KeystoreKeyRepository};
use crate::model::{
    AuthMac, CountryCode, Credentials, Ebid, Ecc, HelloMessageDetail, HelloMessageMac, IdA,
    RequestType,
};
use crate::storage::{FileKeystore, IdentityStore, Storage};

use super::config::CryptoServerConfig;
use super::error::{RobertError, RobertResult};

/// Raw fields of an authenticated request.
#[derive(Clone, Copy, Debug)]
pub struct AuthRequest<'a> {
    pub epoch_id: i32,
    /// NTP seconds at which the application built the request.
    pub time: i64,
    pub ebid: &'a [u8],
    pub mac: &'a [u8],
}

/// Raw parameters of a tuples bundle.
#[derive(Clone, Copy, Debug)]
pub struct BundleRequest<'a> {
    pub server_country_code: &'a [u8],
    pub from_epoch_id: i32,
    pub number_of_days: i32,
}

/// Raw fields of one received HelloMessage.
#[derive(Clone, Copy, Debug)]
pub struct HelloDetailRequest<'a> {
    pub time_sent: i32,
    pub time_received: i64,
    pub mac: &'a [u8],
}

/// A new registration and its first bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub id_a: IdA,
    /// Encrypted tuples bundle.
    pub tuples: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedId {
    pub id_a: IdA,
    pub epoch_id: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusResponse {
    pub id_a: IdA,
    pub epoch_id: i32,
    pub tuples: Vec<u8>,
}

/// Outcome of a contact validation. `id_a` and `epoch_id` are only set
/// when the contact belongs to the server's country.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactReport {
    pub country_code: CountryCode,
    pub id_a: Option<IdA>,
    pub epoch_id: Option<i32>,
    pub invalid_details: Vec<HelloMessageDetail>,
}

/// Crypto server operations.
pub struct RobertCryptoServer {
    clock: RobertClock,
    keys: Arc<dyn KeyRepository>,
    identities: Arc<IdentityService>,
    contacts: HelloMessageValidator,
    max_bundle_days: u32,
}

impl RobertCryptoServer {
    pub fn new(
        config: &CryptoServerConfig,
        keys: Arc<dyn KeyRepository>,
        store: Arc<dyn IdentityStore>,
    ) -> Self {
        let clock = config.clock();
        let identities = Arc::new(IdentityService::new(clock, keys.clone(), store));
        let contacts = HelloMessageValidator::new(
            clock,
            keys.clone(),
            identities.clone(),
            config.hello_tolerance(),
        );
        RobertCryptoServer {
            clock,
            keys,
            identities,
            contacts,
            max_bundle_days: config.max_bundle_days,
        }
    }

    /// Opens the file keystore and identity database named by `config` and
    /// loads every key.
    pub fn open(config: &CryptoServerConfig) -> RobertResult<Self> {
        config.validate()?;

        let keystore = Arc::new(FileKeystore::new(config.keystore_dir.clone()));
        let keys = Arc::new(KeystoreKeyRepository::new(
            keystore,
            config.keystore_pin.clone(),
        ));
        keys.reload(&config.keystore_pin)?;

        let storage = Arc::new(Storage::open(&config.database_path)?);
        info!(
            keystore = %config.keystore_dir.display(),
            database = %config.database_path.display(),
            start = %config.service_start_date,
            "crypto server ready"
        );
        Ok(Self::new(config, keys, storage))
    }

    pub fn clock(&self) -> RobertClock {
        self.clock
    }

    /// Registers an application and returns its first tuples bundle.
    pub fn create_registration(
        &self,
        client_public_key: &[u8],
        bundle: &BundleRequest<'_>,
    ) -> RobertResult<Registration> {
        logged("create_registration", || {
            let (country_code, days) = self.parse_bundle(bundle)?;
            let identity = self.identities.create_identity(client_public_key)?;
            let tuples = self.identities.generate_encrypted_tuples_bundle(
                &identity,
                country_code,
                bundle.from_epoch_id,
                days,
            )?;
            Ok(Registration {
                id_a: *identity.id_a(),
                tuples,
            })
        })
    }

    /// Resolves the idA behind an authenticated request of any type.
    pub fn get_id_from_auth(
        &self,
        request_type: i32,
        request: &AuthRequest<'_>,
    ) -> RobertResult<AuthenticatedId> {
        logged("get_id_from_auth", || {
            let credentials = self.parse_credentials(request_type, request)?;
            let identity = self.identities.authenticate(&credentials)?;
            Ok(AuthenticatedId {
                id_a: *identity.id_a(),
                epoch_id: credentials.epoch_id,
            })
        })
    }

    /// Authenticates a status request and returns a fresh tuples bundle.
    pub fn get_id_from_status(
        &self,
        request: &AuthRequest<'_>,
        bundle: &BundleRequest<'_>,
    ) -> RobertResult<StatusResponse> {
        logged("get_id_from_status", || {
            let credentials =
                self.parse_credentials(i32::from(RequestType::Status.salt()), request)?;
            let (country_code, days) = self.parse_bundle(bundle)?;
            let identity = self.identities.authenticate(&credentials)?;
            let tuples = self.identities.generate_encrypted_tuples_bundle(
                &identity,
                country_code,
                bundle.from_epoch_id,
                days,
            )?;
            Ok(StatusResponse {
                id_a: *identity.id_a(),
                epoch_id: credentials.epoch_id,
                tuples,
            })
        })
    }

    /// Authenticates an unregister request and deletes the identity.
    pub fn delete_id(&self, request: &AuthRequest<'_>) -> RobertResult<IdA> {
        logged("delete_id", || {
            let credentials =
                self.parse_credentials(i32::from(RequestType::Unregister.salt()), request)?;
            let identity = self.identities.authenticate(&credentials)?;
            self.identities.delete(identity.id_a())?;
            Ok(*identity.id_a())
        })
    }

    /// Validates a reported contact.
    pub fn validate_contact(
        &self,
        server_country_code: &[u8],
        ebid: &[u8],
        ecc: &[u8],
        details: &[HelloDetailRequest<'_>],
    ) -> RobertResult<ContactReport> {
        logged("validate_contact", || {
            let server_country = CountryCode::from_slice(server_country_code)?;
            let ebid = Ebid::from_slice(ebid)?;
            let ecc = Ecc::from_slice(ecc)?;
            let details = details
                .iter()
                .map(parse_hello_detail)
                .collect::<RobertResult<Vec<_>>>()?;

            let report = match self.contacts.validate(server_country, ecc, ebid, &details)? {
                ContactValidationResult::UnsupportedCountry(country_code) => ContactReport {
                    country_code,
                    id_a: None,
                    epoch_id: None,
                    invalid_details: Vec::new(),
                },
                ContactValidationResult::Valid(contact) => ContactReport {
                    country_code: contact.country_code,
                    id_a: Some(contact.bluetooth_identifier.id_a),
                    epoch_id: Some(contact.bluetooth_identifier.epoch_id),
                    invalid_details: contact.invalid_details,
                },
            };
            Ok(report)
        })
    }

    /// Re-reads every key from the keystore with `pin`.
    pub fn reload_keys(&self, pin: &str) -> RobertResult<()> {
        logged("reload_keys", || Ok(self.keys.reload(pin)?))
    }

    /// Aliases currently cached by the key repository.
    pub fn cached_key_names(&self) -> BTreeSet<String> {
        self.keys.cached_key_names()
    }

    /// Checks raw credentials: request type, epoch, time, EBID then MAC.
    fn parse_credentials(
        &self,
        request_type: i32,
        request: &AuthRequest<'_>,
    ) -> RobertResult<Credentials> {
        let request_type = RequestType::from_value(request_type)
            .map_err(|_| RobertError::UnknownRequestType(request_type))?;
        if request.epoch_id < 0 {
            return Err(RobertError::InvalidEpoch(request.epoch_id));
        }
        let time = self.clock.at_ntp_timestamp(request.time)?;
        let ebid = Ebid::from_slice(request.ebid)?;
        let mac = AuthMac::from_slice(request.mac)?;
        Ok(Credentials::new(
            request_type,
            request.epoch_id,
            time,
            ebid,
            mac,
        ))
    }

    /// Checks bundle parameters: country code, epoch then length.
    fn parse_bundle(&self, bundle: &BundleRequest<'_>) -> RobertResult<(CountryCode, u32)> {
        let country_code = CountryCode::from_slice(bundle.server_country_code)?;
        if bundle.from_epoch_id < 0 {
            return Err(RobertError::InvalidEpoch(bundle.from_epoch_id));
        }
        let days = u32::try_from(bundle.number_of_days)
            .ok()
            .filter(|days| (1..=self.max_bundle_days).contains(days))
            .ok_or(RobertError::InvalidBundleDays(bundle.number_of_days))?;
        Ok((country_code, days))
    }
}

fn parse_hello_detail(detail: &HelloDetailRequest<'_>) -> RobertResult<HelloMessageDetail> {
    let time_sent = u16::try_from(detail.time_sent)
        .map_err(|_| RobertError::InvalidHelloTime(detail.time_sent))?;
    let mac = HelloMessageMac::from_slice(detail.mac)?;
    Ok(HelloMessageDetail::new(
        time_sent,
        detail.time_received,
        mac,
    ))
}

/// Runs `operation` and logs its failure with the transport status.
fn logged<T>(name: &str, operation: impl FnOnce() -> RobertResult<T>) -> RobertResult<T> {
    operation().map_err(|e| {
        let status = e.status_code();
        if status < 500 {
            info!(operation = name, status, error = %e, "{}", e.description());
        } else {
            error!(operation = name, status, error = %e, "{}", e.description());
        }
        e
    })
}
