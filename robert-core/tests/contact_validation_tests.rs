// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Contact Validation Tests
//!
//! HelloMessage validation: country check, EBID decryption around midnight
//! and the reception time tolerance on both sides of a day boundary.
//! Every day has its own server key, so a wrong-day decryption is caught.

mod common;

use chrono::TimeDelta;

use robert_core::clock::RobertInstant;
use robert_core::contact::{ContactError, ContactValidationResult, ValidContact};
use robert_core::identity::Identity;
use robert_core::model::{CountryCode, Ebid, Ecc, HelloMessageDetail, HelloMessageMac};

use common::{date, daily_keystore, hello_detail, TestServer, COUNTRY};

/// Last epoch of 2022-08-10.
const LAST_EPOCH_OF_DAY: i32 = 96 * 10 - 1;

fn server() -> TestServer {
    TestServer::new(daily_keystore(&[
        date(2022, 8, 9),
        date(2022, 8, 10),
        date(2022, 8, 11),
        date(2022, 8, 12),
    ]))
}

/// Registers an application and returns its tuple for `epoch_id`.
fn broadcaster(server: &TestServer, epoch_id: i32) -> (Identity, Ebid, Ecc) {
    let identity = server.register();
    let ebid = server.ebid(*identity.id_a(), epoch_id);
    let ecc = server.ecc(COUNTRY, &ebid);
    (identity, ebid, ecc)
}

fn seconds(value: i64) -> TimeDelta {
    TimeDelta::seconds(value)
}

fn expect_valid(result: Result<ContactValidationResult, ContactError>) -> ValidContact {
    match result.unwrap() {
        ContactValidationResult::Valid(contact) => contact,
        other => panic!("expected a valid contact, got {:?}", other),
    }
}

// =============================================================================
// Country Check
// =============================================================================

/// Scenario: A contact from another country is not decrypted further
#[test]
fn test_unsupported_country() {
    let server = server();
    let (identity, ebid, _) = broadcaster(&server, 900);
    let foreign = server.ecc(CountryCode(49), &ebid);
    let sent = server.clock.at_epoch(900);
    let details = vec![hello_detail(&identity, foreign, ebid, &sent, &sent)];

    let result = server
        .validator()
        .validate(COUNTRY, foreign, ebid, &details)
        .unwrap();

    assert_eq!(
        result,
        ContactValidationResult::UnsupportedCountry(CountryCode(49))
    );
    assert_eq!(result.country_code(), CountryCode(49));
}

/// Scenario: Unsupported country wins even when the EBID is garbage
#[test]
fn test_unsupported_country_skips_ebid_decryption() {
    let server = server();
    let ebid = Ebid::from_bytes([0x42; 8]);
    let foreign = server.ecc(CountryCode(49), &ebid);

    let result = server
        .validator()
        .validate(COUNTRY, foreign, ebid, &[])
        .unwrap();

    assert_eq!(
        result,
        ContactValidationResult::UnsupportedCountry(CountryCode(49))
    );
}

// =============================================================================
// Valid Contacts
// =============================================================================

/// Scenario: Messages received during the production epoch are all valid
#[test]
fn test_valid_contact_same_day() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, 900);
    let start = server.clock.at_epoch(900);
    let details: Vec<HelloMessageDetail> = [0, 60, 300, 899]
        .iter()
        .map(|offset| {
            let sent = start.plus(seconds(*offset)).unwrap();
            hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(2)).unwrap())
        })
        .collect();

    let contact = expect_valid(server.validator().validate(COUNTRY, ecc, ebid, &details));

    assert_eq!(contact.country_code, COUNTRY);
    assert_eq!(contact.bluetooth_identifier.epoch_id, 900);
    assert_eq!(contact.bluetooth_identifier.id_a, *identity.id_a());
    assert!(contact.invalid_details.is_empty());
}

/// Scenario: Reception more than one epoch after production is invalid
#[test]
fn test_late_reception_same_day_is_invalid() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, 900);
    let sent = server.clock.at_epoch(900).plus(seconds(100)).unwrap();
    let on_time = hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(900)).unwrap());
    let late = hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(901)).unwrap());

    let contact = expect_valid(
        server
            .validator()
            .validate(COUNTRY, ecc, ebid, &[on_time, late]),
    );

    assert_eq!(contact.invalid_details, vec![late]);
}

/// Scenario: Details with a wrong MAC are reported, the others kept
#[test]
fn test_invalid_mac_is_reported() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, 900);
    let sent = server.clock.at_epoch(900).plus(seconds(10)).unwrap();
    let good = hello_detail(&identity, ecc, ebid, &sent, &sent);
    let mut forged = hello_detail(&identity, ecc, ebid, &sent.plus(seconds(5)).unwrap(), &sent);
    forged.mac = HelloMessageMac::from_bytes([0; 5]);

    let contact = expect_valid(
        server
            .validator()
            .validate(COUNTRY, ecc, ebid, &[forged, good]),
    );

    assert_eq!(contact.invalid_details, vec![forged]);
}

// =============================================================================
// Day Boundaries
// =============================================================================

/// Production at 23:59:59 on 2022-08-10.
fn last_second_of_day(server: &TestServer) -> RobertInstant {
    server.clock.at_epoch(LAST_EPOCH_OF_DAY).plus(seconds(899)).unwrap()
}

/// Scenario: Message produced 1s before midnight, received after midnight
#[test]
fn test_received_after_midnight_within_tolerance() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, LAST_EPOCH_OF_DAY);
    let sent = last_second_of_day(&server);
    assert_eq!(sent.utc_date(), date(2022, 8, 10));

    let anchor = hello_detail(&identity, ecc, ebid, &sent, &sent);
    let accepted = hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(170)).unwrap());
    let rejected = hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(200)).unwrap());

    let contact = expect_valid(server.validator().validate(
        COUNTRY,
        ecc,
        ebid,
        &[anchor, accepted, rejected],
    ));

    assert_eq!(contact.bluetooth_identifier.epoch_id, LAST_EPOCH_OF_DAY);
    assert_eq!(contact.invalid_details, vec![rejected]);
}

/// Scenario: The previous day's key is tried for a reception just after midnight
#[test]
fn test_received_after_midnight_decrypts_with_previous_day_key() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, LAST_EPOCH_OF_DAY);
    let sent = last_second_of_day(&server);
    let received = sent.plus(seconds(170)).unwrap();
    assert_eq!(received.utc_date(), date(2022, 8, 11));

    let details = [hello_detail(&identity, ecc, ebid, &sent, &received)];
    let contact = expect_valid(server.validator().validate(COUNTRY, ecc, ebid, &details));

    assert_eq!(contact.bluetooth_identifier.id_a, *identity.id_a());
    assert!(contact.invalid_details.is_empty());
}

/// Scenario: Received too long after midnight, the EBID cannot be decrypted
#[test]
fn test_received_after_midnight_out_of_tolerance() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, LAST_EPOCH_OF_DAY);
    let sent = last_second_of_day(&server);

    let details = [hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(200)).unwrap())];
    let result = server.validator().validate(COUNTRY, ecc, ebid, &details);

    assert!(matches!(result, Err(ContactError::EbidDecryptionFailed)));
}

/// Scenario: Message produced 1s after midnight, received before midnight
#[test]
fn test_received_before_midnight_within_tolerance() {
    let server = server();
    let first_epoch = LAST_EPOCH_OF_DAY + 1;
    let (identity, ebid, ecc) = broadcaster(&server, first_epoch);
    let sent = server.clock.at_epoch(first_epoch).plus(seconds(1)).unwrap();
    assert_eq!(sent.utc_date(), date(2022, 8, 11));

    let accepted = hello_detail(&identity, ecc, ebid, &sent, &sent.minus(seconds(170)).unwrap());
    let rejected = hello_detail(&identity, ecc, ebid, &sent, &sent.minus(seconds(200)).unwrap());

    let contact = expect_valid(
        server
            .validator()
            .validate(COUNTRY, ecc, ebid, &[accepted, rejected]),
    );

    assert_eq!(contact.bluetooth_identifier.epoch_id, first_epoch);
    assert_eq!(contact.invalid_details, vec![rejected]);
}

/// Scenario: Received too long before midnight, the EBID cannot be decrypted
#[test]
fn test_received_before_midnight_out_of_tolerance() {
    let server = server();
    let first_epoch = LAST_EPOCH_OF_DAY + 1;
    let (identity, ebid, ecc) = broadcaster(&server, first_epoch);
    let sent = server.clock.at_epoch(first_epoch).plus(seconds(1)).unwrap();

    let details = [hello_detail(&identity, ecc, ebid, &sent, &sent.minus(seconds(200)).unwrap())];
    let result = server.validator().validate(COUNTRY, ecc, ebid, &details);

    assert!(matches!(result, Err(ContactError::EbidDecryptionFailed)));
}

// =============================================================================
// Failures
// =============================================================================

/// Scenario: A contact without details cannot be decrypted
#[test]
fn test_no_details() {
    let server = server();
    let (_, ebid, ecc) = broadcaster(&server, 900);

    let result = server.validator().validate(COUNTRY, ecc, ebid, &[]);
    assert!(matches!(result, Err(ContactError::EbidDecryptionFailed)));
}

/// Scenario: Reception far from the EBID epoch fails decryption
#[test]
fn test_reception_in_another_epoch_range() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, 900);
    let sent = server.clock.at_epoch(900);

    let details = [hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(3600)).unwrap())];
    let result = server.validator().validate(COUNTRY, ecc, ebid, &details);

    assert!(matches!(result, Err(ContactError::EbidDecryptionFailed)));
}

/// Scenario: A deleted identity is reported as unknown
#[test]
fn test_unknown_identity() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, 900);
    let sent = server.clock.at_epoch(900);
    let details = [hello_detail(&identity, ecc, ebid, &sent, &sent)];

    server.identities.delete(identity.id_a()).unwrap();
    let result = server.validator().validate(COUNTRY, ecc, ebid, &details);

    assert!(matches!(
        result,
        Err(ContactError::UnknownIdentity(id)) if id == *identity.id_a()
    ));
}

/// Scenario: The first decryptable detail decides the identifier
#[test]
fn test_first_matching_detail_is_used() {
    let server = server();
    let (identity, ebid, ecc) = broadcaster(&server, 900);
    let sent = server.clock.at_epoch(900);
    let far = hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(7200)).unwrap());
    let near = hello_detail(&identity, ecc, ebid, &sent, &sent.plus(seconds(30)).unwrap());

    let contact = expect_valid(server.validator().validate(COUNTRY, ecc, ebid, &[far, near]));

    assert_eq!(contact.bluetooth_identifier.id_a, *identity.id_a());
    assert_eq!(contact.invalid_details, vec![far]);
}
