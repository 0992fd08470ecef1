// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HelloMessage validation.
//!
//! Applications record HelloMessages with their own clock, which may drift
//! from the sender's. Near midnight the EBID may have been produced with the
//! previous or next day's server key, so decryption explores the adjacent
//! day when the reception time is within the tolerance of a day boundary.

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use tracing::{debug, info};

use crate::clock::{epoch_duration, RobertClock, RobertInstant};
use crate::identity::{Identity, IdentityService};
use crate::keys::KeyRepository;
use crate::model::{BluetoothIdentifier, CountryCode, Ebid, Ecc, HelloMessage, HelloMessageDetail};

use super::{ContactError, ContactValidationResult, ValidContact};

/// Default drift accepted around day boundaries, in seconds.
pub const DEFAULT_HELLO_TOLERANCE_SECS: i64 = 180;

/// Checks contacts against server keys and registered identities.
pub struct HelloMessageValidator {
    clock: RobertClock,
    keys: Arc<dyn KeyRepository>,
    identities: Arc<IdentityService>,
    tolerance: TimeDelta,
}

impl HelloMessageValidator {
    pub fn new(
        clock: RobertClock,
        keys: Arc<dyn KeyRepository>,
        identities: Arc<IdentityService>,
        tolerance: TimeDelta,
    ) -> Self {
        HelloMessageValidator {
            clock,
            keys,
            identities,
            tolerance,
        }
    }

    pub fn tolerance(&self) -> TimeDelta {
        self.tolerance
    }

    /// Validates a contact reported to the server of `server_country`.
    pub fn validate(
        &self,
        server_country: CountryCode,
        ecc: Ecc,
        ebid: Ebid,
        details: &[HelloMessageDetail],
    ) -> Result<ContactValidationResult, ContactError> {
        let federation_key = self.keys.get_federation_key()?;
        let country_code = ecc.decrypt(&federation_key, &ebid)?;
        if country_code != server_country {
            debug!(%country_code, %server_country, "contact from another country");
            return Ok(ContactValidationResult::UnsupportedCountry(country_code));
        }

        let bluetooth_identifier = self.decrypt_ebid(&ebid, details)?;

        let identity = self
            .identities
            .find(&bluetooth_identifier.id_a)?
            .ok_or(ContactError::UnknownIdentity(bluetooth_identifier.id_a))?;

        let invalid_details = details
            .iter()
            .filter(|detail| {
                !self.is_valid(&identity, &bluetooth_identifier, ecc, ebid, detail)
            })
            .copied()
            .collect();

        Ok(ContactValidationResult::Valid(ValidContact {
            country_code,
            bluetooth_identifier,
            invalid_details,
        }))
    }

    /// Decrypts the EBID with the first reception date key that yields an
    /// epoch next to the reception epoch.
    fn decrypt_ebid(
        &self,
        ebid: &Ebid,
        details: &[HelloMessageDetail],
    ) -> Result<BluetoothIdentifier, ContactError> {
        for detail in details {
            let Ok(reception) = self.clock.at_ntp_timestamp(detail.time_received) else {
                continue;
            };
            let reception_epoch = i64::from(reception.as_epoch_id());

            for date in self.candidate_dates(&reception) {
                let Some(server_key) = self.keys.get_server_key(date) else {
                    continue;
                };
                let candidate = ebid.decrypt(&server_key)?;
                if (i64::from(candidate.epoch_id) - reception_epoch).abs() <= 1 {
                    return Ok(candidate);
                }
            }
        }
        Err(ContactError::EbidDecryptionFailed)
    }

    /// Reception date, plus the adjacent date when the reception is close
    /// enough to midnight.
    fn candidate_dates(&self, reception: &RobertInstant) -> Vec<NaiveDate> {
        let date = reception.utc_date();
        let start_of_day = reception.truncated_to_day();
        let start_of_next_day = start_of_day.plus_days(1).ok();

        let adjacent = if start_of_day.until(reception) <= self.tolerance {
            date.pred_opt()
        } else if start_of_next_day
            .is_some_and(|next| reception.until(&next) <= self.tolerance)
        {
            date.succ_opt()
        } else {
            None
        };

        std::iter::once(date).chain(adjacent).collect()
    }

    fn is_valid(
        &self,
        identity: &Identity,
        bluetooth_identifier: &BluetoothIdentifier,
        ecc: Ecc,
        ebid: Ebid,
        detail: &HelloMessageDetail,
    ) -> bool {
        let Ok(reception) = self.clock.at_ntp_timestamp(detail.time_received) else {
            info!(time_received = detail.time_received, "Reception time out of range");
            return false;
        };
        let Ok(production) = self
            .clock
            .at_epoch(bluetooth_identifier.epoch_id)
            .with_ntp16_lsb(detail.time_sent)
        else {
            info!(time_sent = detail.time_sent, "Send time out of range");
            return false;
        };

        if !self.is_reception_in_window(&production, &reception) {
            info!(%production, %reception, "HelloMessage timestamp is out of tolerance");
            return false;
        }

        let message = HelloMessage::new(ecc, ebid, detail.time_sent);
        if !message.verify_mac(identity.key_for_mac(), &detail.mac) {
            info!("MAC is invalid");
            return false;
        }
        true
    }

    /// Outside the production day the reception must be within the
    /// tolerance of the day bounds. Inside it, within one epoch of the
    /// production instant.
    fn is_reception_in_window(&self, production: &RobertInstant, reception: &RobertInstant) -> bool {
        let begin = production.truncated_to_day();
        let Ok(end) = begin
            .plus_days(1)
            .and_then(|next| next.minus(TimeDelta::microseconds(1)))
        else {
            return false;
        };

        if reception.is_before(&begin) {
            reception.until(&begin) <= self.tolerance
        } else if reception.is_after(&end) {
            end.until(reception) <= self.tolerance
        } else {
            production.until(reception).abs() <= epoch_duration()
        }
    }
}
