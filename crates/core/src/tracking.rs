//! Tracking numbers: `ADU-<YYYYMMDD>-<NNNN>`.
//!
//! The sequence is 1-based per UTC calendar day and zero padded to four
//! digits. Allocation itself lives in the db crate; this module only owns
//! the format.

use chrono::NaiveDate;

use crate::types::Timestamp;

pub const TRACKING_PREFIX: &str = "ADU";

/// How many times allocation is retried after a uniqueness collision
/// before the submission is reported as unavailable.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

/// The calendar day a tracking number is issued for.
pub fn tracking_day(at: Timestamp) -> NaiveDate {
    at.date_naive()
}

pub fn format_tracking_number(day: NaiveDate, sequence: i32) -> String {
    format!("{TRACKING_PREFIX}-{}-{sequence:04}", day.format("%Y%m%d"))
}

/// Split a tracking number into its day and sequence.
pub fn parse_tracking_number(value: &str) -> Option<(NaiveDate, i32)> {
    let mut parts = value.splitn(3, '-');
    if parts.next()? != TRACKING_PREFIX {
        return None;
    }
    let day = parts.next()?;
    if day.len() != 8 {
        return None;
    }
    let day = NaiveDate::parse_from_str(day, "%Y%m%d").ok()?;
    let seq = parts.next()?;
    if seq.len() < 4 || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let seq: i32 = seq.parse().ok()?;
    (seq >= 1).then_some((day, seq))
}
