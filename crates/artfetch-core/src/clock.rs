//! Local-clock queries as stateless functions.
//!
//! Callers stamping committed files with source-declared timestamps need the
//! host's UTC offset and DST state; both are computed on demand from the
//! system clock, with no timezone object carried around.

use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, Offset, TimeZone, Utc};

/// The host's current offset from UTC, in seconds (east positive).
#[must_use]
pub fn local_utc_offset_seconds() -> i32 {
    Local::now().offset().fix().local_minus_utc()
}

/// Render an offset as `+HH:MM` / `-HH:MM`.
#[must_use]
pub fn offset_label(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

/// Whether the host clock is currently in daylight-saving time.
///
/// Determined by comparing the current offset against the year's standard
/// offset (the smaller of the January and July offsets, which covers both
/// hemispheres). Zones without DST always report `false`.
#[must_use]
pub fn is_dst() -> bool {
    let now = Local::now();
    let year = now.year();
    let standard = offset_on(year, 1, 1).min(offset_on(year, 7, 1));
    now.offset().fix().local_minus_utc() > standard
}

/// Convert a UTC timestamp into a [`SystemTime`] suitable for `set_modified`.
#[must_use]
pub fn to_system_time(timestamp: DateTime<Utc>) -> SystemTime {
    timestamp.into()
}

fn offset_on(year: i32, month: u32, day: u32) -> i32 {
    Local
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .earliest()
        .map_or(0, |dt| dt.offset().fix().local_minus_utc())
}
