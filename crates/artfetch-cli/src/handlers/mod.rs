//! Command handlers. Each handler composes the library crates and reports
//! one terminal status line per outcome.

pub mod convert;
pub mod fetch;
pub mod probe;

use std::time::SystemTime;

use anyhow::Context;
use chrono::{DateTime, Utc};

use artfetch_core::clock;

/// Parse an optional RFC 3339 timestamp argument into a [`SystemTime`].
pub(crate) fn parse_timestamp(value: Option<&str>) -> anyhow::Result<Option<SystemTime>> {
    value
        .map(|v| {
            let parsed = DateTime::parse_from_rfc3339(v)
                .with_context(|| format!("invalid timestamp '{v}' (expected RFC 3339)"))?;
            Ok(clock::to_system_time(parsed.with_timezone(&Utc)))
        })
        .transpose()
}
