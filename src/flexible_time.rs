//! Timestamps as GitLab writes them into emoji webhook payloads.
//!
//! Depending on the payload revision a date can arrive as RFC 3339
//! (`2025-12-09T20:44:22Z`) or in the Rails default rendering
//! (`2025-12-09 20:44:22 UTC`). [`FlexibleTime`] reads all of them and always
//! writes RFC 3339 back out.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{FormatError, TimestampParseError};

/// Candidate layouts, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLayout {
    /// `2006-01-02T15:04:05Z07:00`
    Rfc3339,
    /// `2006-01-02T15:04:05.999999999Z07:00`
    Rfc3339Nano,
    /// `2006-01-02 15:04:05 MST`
    SpacedZone,
    /// `2006-01-02 15:04:05.999 MST`
    SpacedZoneFraction,
}

impl TimestampLayout {
    pub const ALL: [TimestampLayout; 4] = [
        TimestampLayout::Rfc3339,
        TimestampLayout::Rfc3339Nano,
        TimestampLayout::SpacedZone,
        TimestampLayout::SpacedZoneFraction,
    ];

    pub fn parse(self, text: &str) -> Result<DateTime<FixedOffset>, TimestampParseError> {
        let parsed = match self {
            TimestampLayout::Rfc3339 => {
                check_rfc3339_shape(text)?;
                DateTime::parse_from_rfc3339(text)?
            }
            TimestampLayout::Rfc3339Nano => {
                check_rfc3339_shape(text)?;
                // chrono's `%:z` does not take the `Z` designator
                let normalized = match text.strip_suffix('Z') {
                    Some(rest) => format!("{rest}+00:00"),
                    None => text.to_string(),
                };
                DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%:z")?
            }
            TimestampLayout::SpacedZone => parse_spaced(text, "%Y-%m-%d %H:%M:%S")?,
            TimestampLayout::SpacedZoneFraction => parse_spaced(text, "%Y-%m-%d %H:%M:%S%.f")?,
        };

        // chrono keeps `:60` as a leap second; seconds stop at 59 here
        if parsed.nanosecond() >= 1_000_000_000 {
            return Err(TimestampParseError::OutOfRange);
        }
        Ok(parsed)
    }
}

/// chrono's RFC 3339 reader also takes a space or `t` separator and a
/// lower-case `z`; only the upper-case forms are accepted.
fn check_rfc3339_shape(text: &str) -> Result<(), TimestampParseError> {
    if text.as_bytes().get(10) != Some(&b'T') {
        return Err(TimestampParseError::Malformed("`T` between date and time"));
    }
    if text.ends_with('z') {
        return Err(TimestampParseError::Malformed("upper-case `Z` offset"));
    }
    Ok(())
}

fn parse_spaced(text: &str, layout: &str) -> Result<DateTime<FixedOffset>, TimestampParseError> {
    let (local, abbreviation) = text
        .rsplit_once(' ')
        .ok_or(TimestampParseError::MissingZone)?;
    let naive = NaiveDateTime::parse_from_str(local, layout)?;
    let offset = zone_offset(abbreviation)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or(TimestampParseError::OutOfRange)
}

/// Offsets for the abbreviations GitLab instances are known to emit.
const ZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("UT", 0),
    ("GMT", 0),
    ("Z", 0),
    ("WET", 0),
    ("WEST", 1),
    ("CET", 1),
    ("CEST", 2),
    ("EET", 2),
    ("EEST", 3),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
    ("JST", 9),
];

/// Three upper-case letters, four or five ending in `T`, plus a few
/// mixed-case names.
fn is_zone_abbreviation(abbreviation: &str) -> bool {
    if matches!(abbreviation, "ChST" | "MeST" | "WITA") {
        return true;
    }
    if !abbreviation.bytes().all(|b| b.is_ascii_uppercase()) {
        return false;
    }
    match abbreviation.len() {
        3 => true,
        4 | 5 => abbreviation.ends_with('T'),
        _ => false,
    }
}

/// Known abbreviations get their real offset. Any other well-formed
/// abbreviation is read as a zone at offset zero.
fn zone_offset(abbreviation: &str) -> Result<FixedOffset, TimestampParseError> {
    let hours = match ZONES.iter().find(|(name, _)| *name == abbreviation) {
        Some((_, hours)) => *hours,
        None if is_zone_abbreviation(abbreviation) => 0,
        None => return Err(TimestampParseError::UnknownZone(abbreviation.to_string())),
    };
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| TimestampParseError::UnknownZone(abbreviation.to_string()))
}

/// Parses unquoted timestamp text, reporting which layout matched.
///
/// Layouts are tried in [`TimestampLayout::ALL`] order and the first success
/// wins. On failure the error carries the error of the last layout tried.
pub fn parse_with_layout(
    text: &str,
) -> Result<(DateTime<FixedOffset>, TimestampLayout), FormatError> {
    let mut last_err = TimestampParseError::MissingZone;
    for layout in TimestampLayout::ALL {
        match layout.parse(text) {
            Ok(parsed) => return Ok((parsed, layout)),
            Err(err) => last_err = err,
        }
    }

    Err(FormatError::Unparseable {
        text: text.to_string(),
        source: last_err,
    })
}

pub fn parse_flexible_timestamp(text: &str) -> Result<DateTime<FixedOffset>, FormatError> {
    parse_with_layout(text).map(|(parsed, _)| parsed)
}

/// Canonical rendering: RFC 3339, whole seconds, `Z` for a zero offset.
pub fn format_flexible_timestamp(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A point in time that decodes from any supported layout and keeps the
/// offset it was written with.
///
/// Equality and ordering compare instants, so `20:44:22 UTC` and
/// `21:44:22+01:00` are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlexibleTime(DateTime<FixedOffset>);

impl FlexibleTime {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        FlexibleTime(instant)
    }

    /// Decodes a raw JSON string token, surrounding quotes included.
    pub fn from_json_token(raw: &str) -> Result<Self, FormatError> {
        if raw.len() < 2 {
            return Err(FormatError::InvalidTimeValue(raw.to_string()));
        }
        let inner = raw
            .get(1..raw.len() - 1)
            .ok_or_else(|| FormatError::InvalidTimeValue(raw.to_string()))?;
        parse_flexible_timestamp(inner).map(FlexibleTime)
    }

    pub fn into_inner(self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl Deref for FlexibleTime {
    type Target = DateTime<FixedOffset>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FlexibleTime {
    fn from(instant: DateTime<Tz>) -> Self {
        FlexibleTime(instant.fixed_offset())
    }
}

impl FromStr for FlexibleTime {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_flexible_timestamp(s).map(FlexibleTime)
    }
}

impl fmt::Display for FlexibleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_flexible_timestamp(&self.0))
    }
}

impl Serialize for FlexibleTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_flexible_timestamp(&self.0))
    }
}

impl<'de> Deserialize<'de> for FlexibleTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
