// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Protocol Clock Tests
//!
//! Epoch numbering, NTP conversions and the truncated time encodings
//! exchanged with applications.

mod common;

use chrono::{TimeDelta, TimeZone, Utc};

use robert_core::clock::{RobertClock, RobertInstant, EPOCH_DURATION_SECS, NTP_UNIX_OFFSET_SECS};

use common::{clock, date};

// =============================================================================
// Epochs
// =============================================================================

/// Scenario: Epoch 0 starts at the service start date, UTC midnight
#[test]
fn test_epoch_zero_is_start_date() {
    let clock = clock();
    let start = clock.at_epoch(0);

    assert_eq!(
        start.as_datetime(),
        Utc.with_ymd_and_hms(2022, 8, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(start.as_epoch_id(), 0);
    assert_eq!(EPOCH_DURATION_SECS, 900);
}

/// Scenario: Epoch ids are truncated, never rounded
#[test]
fn test_epoch_id_truncates() {
    let clock = clock();
    let epoch_100 = clock.at_epoch(100);

    assert_eq!(epoch_100.to_string(), "2022-08-02T01:00:00Z=100E");
    assert_eq!(epoch_100.plus(TimeDelta::seconds(899)).unwrap().as_epoch_id(), 100);
    assert_eq!(epoch_100.plus(TimeDelta::milliseconds(899_999)).unwrap().as_epoch_id(), 100);
    assert_eq!(epoch_100.plus(TimeDelta::seconds(900)).unwrap().as_epoch_id(), 101);
    assert_eq!(epoch_100.minus(TimeDelta::milliseconds(1)).unwrap().as_epoch_id(), 99);
}

/// Scenario: Instants before the start date have negative epochs
#[test]
fn test_epoch_before_start_is_negative() {
    let clock = clock();
    let before = clock.at_epoch(0).minus(TimeDelta::seconds(1)).unwrap();
    assert_eq!(before.as_epoch_id(), -1);
}

/// Scenario: A day holds 96 epochs
#[test]
fn test_day_boundaries() {
    let clock = clock();
    assert_eq!(clock.at_epoch(95).utc_date(), date(2022, 8, 1));
    assert_eq!(clock.at_epoch(96).utc_date(), date(2022, 8, 2));
    assert_eq!(
        clock.at_epoch(100).truncated_to_day(),
        clock.at_epoch(96)
    );
    assert_eq!(
        clock.at_epoch(100).plus(TimeDelta::seconds(42)).unwrap().truncated_to_epoch(),
        clock.at_epoch(100)
    );
}

/// Scenario: Epoch ranges stop before the end instant
#[test]
fn test_epochs_until_is_end_exclusive() {
    let clock = clock();
    let begin = clock.at_epoch(90).plus(TimeDelta::seconds(30)).unwrap();
    let end = begin.truncated_to_day().plus_days(1).unwrap();

    let epochs: Vec<i32> = begin.epochs_until(&end).map(|e| e.as_epoch_id()).collect();
    assert_eq!(epochs, (90..96).collect::<Vec<_>>());

    assert_eq!(end.epochs_until(&begin).count(), 0);
}

// =============================================================================
// NTP and Truncated Times
// =============================================================================

/// Scenario: NTP seconds count from 1900
#[test]
fn test_ntp_timestamp() {
    let clock = clock();
    let start = clock.at_epoch(0);

    assert_eq!(start.as_ntp_timestamp(), 3_868_300_800);
    assert_eq!(
        start.as_ntp_timestamp() - start.as_unix_timestamp(),
        NTP_UNIX_OFFSET_SECS
    );
    assert_eq!(clock.at_ntp_timestamp(3_868_300_800).unwrap(), start);
}

/// Scenario: time32 is the big-endian low 32 bits of the NTP time
#[test]
fn test_time32() {
    let clock = clock();
    let start = clock.at_epoch(0);

    assert_eq!(start.as_time32(), [0xe6, 0x91, 0x96, 0x00]);
    assert_eq!(clock.at_time32([0xe6, 0x91, 0x96, 0x00]).unwrap(), start);
    assert_eq!(start.as_16_lsb_of_ntp(), 0x9600);
}

/// Scenario: time32 wraps in February 2036
#[test]
fn test_time32_wraps_in_2036() {
    let clock = clock();
    let wrap = clock.at(Utc.with_ymd_and_hms(2036, 2, 7, 6, 28, 16).unwrap());

    assert_eq!(wrap.as_time32(), [0, 0, 0, 0]);
    assert_eq!(
        clock.at_time32(wrap.as_time32()).unwrap().as_datetime(),
        Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap()
    );
}

/// Scenario: A 16-bit send time is resolved next to its epoch
#[test]
fn test_with_ntp16_lsb_resolves_within_epoch() {
    let clock = clock();
    let epoch_start = clock.at_epoch(959);
    let sent = epoch_start.plus(TimeDelta::seconds(899)).unwrap();

    assert_eq!(epoch_start.with_ntp16_lsb(sent.as_16_lsb_of_ntp()).unwrap(), sent);
}

/// Scenario: The 16-bit resolution also works backwards
#[test]
fn test_with_ntp16_lsb_resolves_earlier_time() {
    let clock = clock();
    let reference = clock.at_epoch(500);
    let earlier = reference.minus(TimeDelta::seconds(20_000)).unwrap();

    assert_eq!(reference.with_ntp16_lsb(earlier.as_16_lsb_of_ntp()).unwrap(), earlier);
}

/// Scenario: Sub-second precision is dropped by the 16-bit resolution
#[test]
fn test_with_ntp16_lsb_truncates_to_second() {
    let clock = clock();
    let reference = clock.at_epoch(10).plus(TimeDelta::milliseconds(1500)).unwrap();
    let resolved = reference.with_ntp16_lsb(reference.as_16_lsb_of_ntp()).unwrap();

    assert_eq!(resolved, clock.at_epoch(10).plus(TimeDelta::seconds(1)).unwrap());
}

// =============================================================================
// Formatting
// =============================================================================

/// Scenario: Display form parses back to the same instant and clock
#[test]
fn test_display_roundtrip() {
    let clock = clock();
    let instant = clock.at_epoch(2384).plus(TimeDelta::seconds(5)).unwrap();

    let parsed: RobertInstant = instant.to_string().parse().unwrap();
    assert_eq!(parsed, instant);
    assert_eq!(parsed.clock().start_date(), date(2022, 8, 1));
}

/// Scenario: Malformed start dates are rejected
#[test]
fn test_invalid_start_date() {
    assert!(RobertClock::parse("2022-13-01").is_err());
    assert!("not an instant".parse::<RobertInstant>().is_err());
}
