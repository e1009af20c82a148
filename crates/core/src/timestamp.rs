//! Timestamps that arrive in more than one textual layout
//!
//! Upstream APIs are inconsistent about how they render the same field, so
//! [`FlexibleTimestamp`] accepts any of:
//!
//! 1. RFC 3339 (`2024-07-31T01:16:17Z`, `2024-07-31T01:16:17+09:00`)
//! 2. date, time and numeric offset (`2024-07-31 01:16:17 +0000`)
//! 3. date, time and zone abbreviation (`2024-07-31 01:16:17 UTC`)
//!
//! and always writes layout 2. The value round-trips, the text does not.
//!
//! # Example
//!
//! ```rust
//! use addons_core::timestamp::FlexibleTimestamp;
//!
//! let ts: FlexibleTimestamp = "2024-07-31T01:16:17Z".parse().unwrap();
//! assert_eq!(ts.encode_json(), "\"2024-07-31 01:16:17 +0000\"");
//! assert_eq!(FlexibleTimestamp::unset().encode_json(), "null");
//! ```

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Layout used for encoding, and the second layout tried on decode
const OFFSET_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Date and time part of the zone-abbreviation layout
const NAIVE_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Unix seconds of 0001-01-01T00:00:00Z, the zero instant
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

/// Zone abbreviations accepted by the third layout, with their UTC offsets in seconds
const ZONE_ABBREVIATIONS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("UT", 0),
    ("GMT", 0),
    ("Z", 0),
    ("JST", 9 * 3600),
    ("KST", 9 * 3600),
    ("SGT", 8 * 3600),
    ("HKT", 8 * 3600),
    ("AEST", 10 * 3600),
    ("CET", 3600),
    ("CEST", 2 * 3600),
    ("EST", -5 * 3600),
    ("EDT", -4 * 3600),
    ("CST", -6 * 3600),
    ("CDT", -5 * 3600),
    ("MST", -7 * 3600),
    ("MDT", -6 * 3600),
    ("PST", -8 * 3600),
    ("PDT", -7 * 3600),
];

/// An absolute instant with the UTC offset it was observed in, or nothing
///
/// The default value is unset and encodes as JSON `null`. Equality compares
/// instants, so the same moment written with different offsets is equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlexibleTimestamp(Option<DateTime<FixedOffset>>);

impl FlexibleTimestamp {
    /// The zero value
    pub const fn unset() -> Self {
        Self(None)
    }

    /// Wrap an instant; the zero instant becomes the unset value
    pub fn new<Tz: TimeZone>(instant: DateTime<Tz>) -> Self {
        let offset = instant.offset().fix();
        let instant = instant.with_timezone(&offset);
        if instant.timestamp() == ZERO_INSTANT_SECS && instant.timestamp_subsec_nanos() == 0 {
            Self(None)
        } else {
            Self(Some(instant))
        }
    }

    /// Current time in UTC
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Parse timestamp text against the accepted layouts in order
    ///
    /// The first layout that succeeds wins. When none does, the error from the
    /// last layout is reported together with the input text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut last_error = String::new();

        for layout in [parse_rfc3339, parse_numeric_offset, parse_zone_abbreviation] {
            match layout(text) {
                Ok(instant) => return Ok(Self::new(instant)),
                Err(reason) => last_error = reason,
            }
        }

        Err(Error::unparseable_timestamp(text, last_error))
    }

    /// Decode a raw JSON value (`"..."` or `null`)
    pub fn decode_json(raw: &str) -> Result<Self> {
        let text: Option<String> = serde_json::from_str(raw.trim())
            .map_err(|e| Error::unparseable_timestamp(raw, &e).with_source(e))?;

        match text {
            Some(text) => Self::parse(&text),
            None => Ok(Self::unset()),
        }
    }

    /// Encode as a raw JSON value
    pub fn encode_json(&self) -> String {
        match self.canonical() {
            Some(text) => format!("\"{text}\""),
            None => "null".to_string(),
        }
    }

    /// Canonical text form, `None` when unset
    pub fn canonical(&self) -> Option<String> {
        self.0.map(|instant| instant.format(OFFSET_LAYOUT).to_string())
    }

    /// Whether an instant is present
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// The wrapped instant, in the offset it was decoded with
    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        self.0
    }

    /// The wrapped instant converted to UTC
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        self.0.map(|instant| instant.with_timezone(&Utc))
    }
}

fn parse_rfc3339(text: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(text).map_err(|e| e.to_string())
}

fn parse_numeric_offset(text: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_str(text, OFFSET_LAYOUT).map_err(|e| e.to_string())
}

fn parse_zone_abbreviation(text: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    let (local, zone) = text
        .rsplit_once(' ')
        .ok_or_else(|| "missing zone abbreviation".to_string())?;

    let seconds = ZONE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == zone)
        .map(|(_, seconds)| *seconds)
        .ok_or_else(|| format!("unknown zone abbreviation {zone:?}"))?;

    let naive = NaiveDateTime::parse_from_str(local, NAIVE_LAYOUT).map_err(|e| e.to_string())?;

    FixedOffset::east_opt(seconds)
        .and_then(|offset| offset.from_local_datetime(&naive).single())
        .ok_or_else(|| format!("{zone} offset out of range"))
}

impl FromStr for FlexibleTimestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FlexibleTimestamp {
    fn from(instant: DateTime<Tz>) -> Self {
        Self::new(instant)
    }
}

impl fmt::Display for FlexibleTimestamp {
    /// `2024-07-31 01:15:11 +0900 +0900`; the zone label is the numeric offset
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(instant) => write!(
                f,
                "{} {}",
                instant.format(OFFSET_LAYOUT),
                instant.format("%z")
            ),
            None => f.write_str("<unset>"),
        }
    }
}

impl Serialize for FlexibleTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.canonical() {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FlexibleTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => Self::parse(&text).map_err(D::Error::custom),
            None => Ok(Self::unset()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_numeric_offset_zero_display() {
        let ts = FlexibleTimestamp::decode_json(r#""2024-07-31 01:15:11 +0000""#).unwrap();
        assert_eq!(ts.to_string(), "2024-07-31 01:15:11 +0000 +0000");
    }

    #[test]
    fn test_numeric_offset_is_preserved() {
        let ts = FlexibleTimestamp::decode_json(r#""2024-07-31 01:15:11 +0900""#).unwrap();
        assert_eq!(ts.to_string(), "2024-07-31 01:15:11 +0900 +0900");

        let instant = ts.instant().unwrap();
        assert_eq!(instant.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(instant.hour(), 1);
        assert_eq!(ts.to_utc().unwrap().day(), 30);
    }

    #[test]
    fn test_all_layouts_decode_to_the_same_instant() {
        let expected = FlexibleTimestamp::parse("2024-07-31T01:16:17Z").unwrap();

        for text in [
            "2024-07-31T01:16:17Z",
            "2024-07-31T10:16:17+09:00",
            "2024-07-31 01:16:17 +0000",
            "2024-07-31 03:16:17 +0200",
            "2024-07-31 01:16:17 UTC",
            "2024-07-31 10:16:17 JST",
            "2024-07-30 18:16:17 PDT",
            "2024-07-30 19:16:17 CST",
            "2024-07-30 20:16:17 CDT",
        ] {
            assert_eq!(FlexibleTimestamp::parse(text).unwrap(), expected, "{text}");
        }
    }

    #[test]
    fn test_encode_uses_canonical_layout() {
        let ts = FlexibleTimestamp::parse("2024-07-31T01:16:17Z").unwrap();
        assert_eq!(ts.encode_json(), r#""2024-07-31 01:16:17 +0000""#);

        let ts = FlexibleTimestamp::parse("2024-07-31 01:16:17 UTC").unwrap();
        assert_eq!(ts.encode_json(), r#""2024-07-31 01:16:17 +0000""#);

        let ts = FlexibleTimestamp::parse("2024-07-31T01:16:17+09:00").unwrap();
        assert_eq!(ts.encode_json(), r#""2024-07-31 01:16:17 +0900""#);
    }

    #[test]
    fn test_numeric_offset_round_trips_textually() {
        let raw = r#""2024-07-31 01:16:17 -0530""#;
        let ts = FlexibleTimestamp::decode_json(raw).unwrap();
        assert_eq!(ts.encode_json(), raw);
    }

    #[test]
    fn test_value_round_trip() {
        for text in [
            "2024-07-31T01:16:17Z",
            "2024-07-31T01:16:17.250+09:00",
            "2024-07-31 01:16:17 +0000",
            "2024-07-31 01:16:17.000123 -0300",
            "2024-07-31 01:16:17 CEST",
        ] {
            let first = FlexibleTimestamp::parse(text).unwrap();
            let again = FlexibleTimestamp::decode_json(&first.encode_json()).unwrap();
            assert_eq!(again, first, "{text}");
        }
    }

    #[test]
    fn test_zero_value_encodes_null() {
        let ts = FlexibleTimestamp::default();
        assert!(!ts.is_set());
        assert_eq!(ts.encode_json(), "null");
        assert_eq!(serde_json::to_string(&ts).unwrap(), "null");
    }

    #[test]
    fn test_is_set() {
        assert!(!FlexibleTimestamp::unset().is_set());
        assert!(!FlexibleTimestamp::decode_json("null").unwrap().is_set());
        assert!(!FlexibleTimestamp::parse("0001-01-01 00:00:00 +0000").unwrap().is_set());
        assert!(FlexibleTimestamp::parse("1970-01-01T00:00:00Z").unwrap().is_set());
        assert!(FlexibleTimestamp::now().is_set());
    }

    #[test]
    fn test_unparseable_reports_input_and_last_error() {
        let err = FlexibleTimestamp::parse("2024-07-31 01:16:17 XYZT").unwrap_err();
        assert!(err.is_unparseable_timestamp());
        assert!(err.message.contains("2024-07-31 01:16:17 XYZT"));
        assert!(err.message.contains("unknown zone abbreviation"));

        let err = FlexibleTimestamp::parse("last tuesday").unwrap_err();
        assert!(err.is_unparseable_timestamp());
    }

    #[test]
    fn test_decode_json_rejects_non_strings() {
        let err = FlexibleTimestamp::decode_json("1722388577").unwrap_err();
        assert!(err.is_unparseable_timestamp());
    }

    #[test]
    fn test_serde_fields() {
        #[derive(Debug, Serialize, Deserialize)]
        struct Record {
            #[serde(default)]
            created_at: Option<FlexibleTimestamp>,
            updated_at: FlexibleTimestamp,
        }

        let record: Record =
            serde_json::from_str(r#"{"updated_at": "2024-07-31T01:16:17Z"}"#).unwrap();
        assert!(record.created_at.is_none());
        assert!(record.updated_at.is_set());

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"created_at":null,"updated_at":"2024-07-31 01:16:17 +0000"}"#
        );

        let bad = serde_json::from_str::<Record>(r#"{"updated_at": "not a time"}"#);
        assert!(bad.is_err());
    }
}
