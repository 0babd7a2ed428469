//! Timestamp coercion for `publishedAt`.
//!
//! Whatever the source sends is turned into a UTC-naive datetime, or `None`
//! when it cannot be parsed. `None` is never an error: such records stay in
//! the article table and the flagged pool, but are left out of every daily
//! aggregate.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Parse a raw timestamp into UTC (offset applied, then dropped).
///
/// Accepted: RFC 3339 / ISO-8601 with `Z` or an offset, ISO without offset
/// (taken as UTC), a bare `YYYY-MM-DD` (midnight) and RFC 2822.
pub fn parse_published_at(raw: Option<&str>) -> Option<NaiveDateTime> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for f in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, f) {
            return Some(dt.naive_utc());
        }
    }
    for f in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    parse_rfc2822(s)
}

fn parse_rfc2822(s: &str) -> Option<NaiveDateTime> {
    let odt = OffsetDateTime::parse(s, &Rfc2822).ok()?;
    let dt = DateTime::<Utc>::from_timestamp(odt.unix_timestamp(), odt.nanosecond())?;
    Some(dt.naive_utc())
}

/// Calendar date used as the aggregation key.
pub fn date_of(dt: Option<NaiveDateTime>) -> Option<NaiveDate> {
    dt.map(|d| d.date())
}

/// Most recent first; `None` after every real timestamp.
pub fn cmp_recent_first(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
