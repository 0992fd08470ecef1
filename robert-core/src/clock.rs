// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Protocol Clock
//!
//! Converts between wall-clock instants, NTP seconds (since 1900-01-01),
//! Unix seconds and protocol epochs. Epochs last 15 minutes and are counted
//! from the service start date at UTC midnight.
//!
//! `time32` is the NTP timestamp truncated to 32 bits, big-endian. It wraps
//! in February 2036; this is a protocol limitation kept for compatibility
//! with deployed applications.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeDelta, Timelike, Utc};
use thiserror::Error;

/// Duration of one epoch, in seconds.
pub const EPOCH_DURATION_SECS: i64 = 15 * 60;

/// Seconds between 1900-01-01 (NTP era 0) and 1970-01-01.
pub const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Clock error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Timestamp out of range: {0}")]
    OutOfRange(i64),
    #[error("Invalid instant format: {0}")]
    InvalidFormat(String),
    #[error("Instant out of range after adding {0}")]
    Overflow(TimeDelta),
}

/// One epoch as a chrono duration.
pub fn epoch_duration() -> TimeDelta {
    TimeDelta::seconds(EPOCH_DURATION_SECS)
}

/// Clock anchored at the service start date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RobertClock {
    start: DateTime<Utc>,
}

impl RobertClock {
    /// Creates a clock whose epoch 0 begins at `start_date` 00:00 UTC.
    pub fn new(start_date: NaiveDate) -> Self {
        RobertClock {
            start: start_date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }

    /// Creates a clock from an ISO-8601 date such as `2020-06-01`.
    pub fn parse(start_date: &str) -> Result<Self, ClockError> {
        NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
            .map(Self::new)
            .map_err(|e| ClockError::InvalidDate(format!("{}: {}", start_date, e)))
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn now(&self) -> RobertInstant {
        self.at(Utc::now())
    }

    pub fn at(&self, time: DateTime<Utc>) -> RobertInstant {
        RobertInstant { clock: *self, time }
    }

    pub fn at_unix_timestamp(&self, unix_seconds: i64) -> Result<RobertInstant, ClockError> {
        DateTime::from_timestamp(unix_seconds, 0)
            .map(|time| self.at(time))
            .ok_or(ClockError::OutOfRange(unix_seconds))
    }

    pub fn at_ntp_timestamp(&self, ntp_seconds: i64) -> Result<RobertInstant, ClockError> {
        let unix_seconds = ntp_seconds
            .checked_sub(NTP_UNIX_OFFSET_SECS)
            .ok_or(ClockError::OutOfRange(ntp_seconds))?;
        self.at_unix_timestamp(unix_seconds)
    }

    /// Returns the instant at which `epoch_id` begins.
    pub fn at_epoch(&self, epoch_id: i32) -> RobertInstant {
        self.at(self.start + TimeDelta::seconds(i64::from(epoch_id) * EPOCH_DURATION_SECS))
    }

    /// Interprets 4 big-endian bytes as the low 32 bits of an NTP timestamp.
    pub fn at_time32(&self, time32: [u8; 4]) -> Result<RobertInstant, ClockError> {
        self.at_ntp_timestamp(i64::from(u32::from_be_bytes(time32)))
    }
}

/// Instant on a [`RobertClock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RobertInstant {
    clock: RobertClock,
    time: DateTime<Utc>,
}

impl RobertInstant {
    pub fn clock(&self) -> RobertClock {
        self.clock
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn as_unix_timestamp(&self) -> i64 {
        self.time.timestamp()
    }

    pub fn as_ntp_timestamp(&self) -> i64 {
        self.as_unix_timestamp() + NTP_UNIX_OFFSET_SECS
    }

    /// Number of whole epochs elapsed since the clock start, rounded down.
    pub fn as_epoch_id(&self) -> i32 {
        let elapsed_ms = (self.time - self.clock.start).num_milliseconds();
        let epoch = elapsed_ms.div_euclid(EPOCH_DURATION_SECS * 1000);
        epoch.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Low 32 bits of the NTP timestamp, big-endian.
    pub fn as_time32(&self) -> [u8; 4] {
        ((self.as_ntp_timestamp() & 0xFFFF_FFFF) as u32).to_be_bytes()
    }

    /// Low 16 bits of the NTP timestamp.
    pub fn as_16_lsb_of_ntp(&self) -> u16 {
        (self.as_ntp_timestamp() & 0xFFFF) as u16
    }

    /// Rebuilds a full instant from the low 16 bits of an NTP timestamp.
    ///
    /// Of the instants whose NTP seconds end with `lsb`, picks the one
    /// closest to `self`. The result is at most 32768 seconds away.
    pub fn with_ntp16_lsb(&self, lsb: u16) -> Result<RobertInstant, ClockError> {
        let ntp = self.as_ntp_timestamp();
        let base = (ntp & !0xFFFF) + i64::from(lsb);
        let nearest = [base - 0x1_0000, base, base + 0x1_0000]
            .into_iter()
            .min_by_key(|candidate| (candidate - ntp).abs())
            .unwrap_or(base);
        Ok(self
            .plus(TimeDelta::seconds(nearest - ntp))?
            .truncated_to_second())
    }

    pub fn plus(&self, delta: TimeDelta) -> Result<RobertInstant, ClockError> {
        self.time
            .checked_add_signed(delta)
            .map(|time| self.clock.at(time))
            .ok_or(ClockError::Overflow(delta))
    }

    pub fn minus(&self, delta: TimeDelta) -> Result<RobertInstant, ClockError> {
        self.time
            .checked_sub_signed(delta)
            .map(|time| self.clock.at(time))
            .ok_or(ClockError::Overflow(-delta))
    }

    pub fn plus_epochs(&self, epochs: i32) -> Result<RobertInstant, ClockError> {
        self.plus(TimeDelta::seconds(i64::from(epochs) * EPOCH_DURATION_SECS))
    }

    pub fn plus_days(&self, days: i64) -> Result<RobertInstant, ClockError> {
        let delta = days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(TimeDelta::try_seconds)
            .ok_or(ClockError::OutOfRange(days))?;
        self.plus(delta)
    }

    fn truncated_to_second(&self) -> RobertInstant {
        self.clock
            .at(self.time.with_nanosecond(0).unwrap_or(self.time))
    }

    /// Start of the UTC day containing this instant.
    pub fn truncated_to_day(&self) -> RobertInstant {
        let midnight = self.utc_date().and_time(chrono::NaiveTime::MIN);
        self.clock.at(midnight.and_utc())
    }

    /// Start of the epoch containing this instant.
    pub fn truncated_to_epoch(&self) -> RobertInstant {
        self.clock.at_epoch(self.as_epoch_id())
    }

    /// Epoch start instants from this instant's epoch up to `end_exclusive`.
    pub fn epochs_until(
        &self,
        end_exclusive: &RobertInstant,
    ) -> impl Iterator<Item = RobertInstant> {
        let end = end_exclusive.time;
        std::iter::successors(Some(self.truncated_to_epoch()), |instant| {
            instant.plus_epochs(1).ok()
        })
        .take_while(move |instant| instant.time < end)
    }

    /// Signed duration from this instant to `other`.
    pub fn until(&self, other: &RobertInstant) -> TimeDelta {
        other.time - self.time
    }

    pub fn utc_date(&self) -> NaiveDate {
        self.time.date_naive()
    }

    pub fn is_before(&self, other: &RobertInstant) -> bool {
        self.time < other.time
    }

    pub fn is_after(&self, other: &RobertInstant) -> bool {
        self.time > other.time
    }
}

impl PartialOrd for RobertInstant {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RobertInstant {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time.cmp(&other.time)
    }
}

impl fmt::Display for RobertInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}E",
            self.time.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
            self.as_epoch_id()
        )
    }
}

/// Parses the `Display` form, e.g. `2022-08-01T00:15:00Z=1E`.
///
/// The clock start is recovered from the epoch count.
impl FromStr for RobertInstant {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClockError::InvalidFormat(s.to_string());
        let (time, epoch) = s.split_once('=').ok_or_else(invalid)?;
        let epoch_id: i64 = epoch
            .strip_suffix('E')
            .and_then(|e| e.parse().ok())
            .ok_or_else(invalid)?;
        let time = DateTime::parse_from_rfc3339(time)
            .map_err(|_| invalid())?
            .with_timezone(&Utc);
        let start = time
            .checked_sub_signed(TimeDelta::seconds(epoch_id * EPOCH_DURATION_SECS))
            .ok_or_else(invalid)?;
        let clock = RobertClock::new(start.date_naive());
        Ok(clock.at(time))
    }
}
