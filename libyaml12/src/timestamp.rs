//! YAML timestamps.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

static PARTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})",
        r"(?:(?:[Tt]|[ \t]+)([0-9]{1,2}):([0-9]{2}):([0-9]{2})(?:\.([0-9]*))?",
        r"(?:[ \t]*(Z|([-+])([0-9]{1,2})(?::([0-9]{2}))?))?)?$",
    ))
    .unwrap()
});

/// A timestamp keeps the precision it was written with: date only, date
/// and time without a zone, or date and time with an offset.
///
/// Timestamps with an offset compare equal when they denote the same
/// instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timestamp {
    Date(NaiveDate),
    Local(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

fn number(caps: &Captures<'_>, i: usize) -> Option<u32> {
    caps.get(i)?.as_str().parse().ok()
}

/// Nanoseconds from the digits after the decimal point. Digits beyond
/// nanosecond precision are dropped.
fn nanos(fraction: &str) -> u32 {
    let digits: String = fraction.chars().take(9).collect();
    if digits.is_empty() {
        return 0;
    }
    let scale = 10u32.pow(9 - digits.len() as u32);
    digits.parse::<u32>().unwrap_or(0) * scale
}

impl Timestamp {
    /// Parse the YAML timestamp grammar. Returns `None` for text that does
    /// not match it or names an impossible date or time.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = PARTS_RE.captures(text)?;
        let date = NaiveDate::from_ymd_opt(
            caps.get(1)?.as_str().parse().ok()?,
            number(&caps, 2)?,
            number(&caps, 3)?,
        )?;
        if caps.get(4).is_none() {
            return Some(Timestamp::Date(date));
        }

        let fraction = caps.get(7).map_or("", |m| m.as_str());
        let time = NaiveTime::from_hms_nano_opt(
            number(&caps, 4)?,
            number(&caps, 5)?,
            number(&caps, 6)?,
            nanos(fraction),
        )?;
        let naive = date.and_time(time);

        let zone = match caps.get(8) {
            Some(zone) => zone.as_str(),
            None => return Some(Timestamp::Local(naive)),
        };
        let seconds = if zone == "Z" {
            0
        } else {
            let hours = number(&caps, 10)? as i32;
            let minutes = number(&caps, 11).unwrap_or(0) as i32;
            let magnitude = hours * 3600 + minutes * 60;
            if caps.get(9)?.as_str() == "-" {
                -magnitude
            } else {
                magnitude
            }
        };
        let offset = FixedOffset::east_opt(seconds)?;
        let instant = offset.from_local_datetime(&naive).single()?;
        Some(Timestamp::Offset(instant))
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Timestamp::Date(d) => *d,
            Timestamp::Local(dt) => dt.date(),
            Timestamp::Offset(dt) => dt.date_naive(),
        }
    }
}

impl fmt::Display for Timestamp {
    /// ISO 8601, with the offset as written (`Z` for UTC).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Timestamp::Local(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Timestamp::Offset(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}
