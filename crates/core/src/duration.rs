//! Human-written duration parsing
//!
//! Converts tokens such as `"14d"`, `"90 minutes"` or `"9845seconds"` into a
//! count of milliseconds. The grammar is closed: there are no month or year
//! units because those have no fixed length.
//!
//! # Example
//!
//! ```rust
//! use addons_core::duration::parse_duration;
//!
//! assert_eq!(parse_duration("14d").unwrap(), 1_209_600_000);
//! assert!(parse_duration("1month").is_err());
//! ```

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+) ?(ms|milliseconds?|s|seconds?|m|minutes?|h|hours?|d|days?|w|weeks?)$",
    )
    .unwrap()
});

/// Unit magnitudes recognized by [`parse_duration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    /// `ms`, `millisecond`, `milliseconds`
    Milliseconds,
    /// `s`, `second`, `seconds`
    Seconds,
    /// `m`, `minute`, `minutes`
    Minutes,
    /// `h`, `hour`, `hours`
    Hours,
    /// `d`, `day`, `days`
    Days,
    /// `w`, `week`, `weeks`
    Weeks,
}

impl DurationUnit {
    /// Map a unit spelling to its magnitude
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ms" | "millisecond" | "milliseconds" => Some(Self::Milliseconds),
            "s" | "second" | "seconds" => Some(Self::Seconds),
            "m" | "minute" | "minutes" => Some(Self::Minutes),
            "h" | "hour" | "hours" => Some(Self::Hours),
            "d" | "day" | "days" => Some(Self::Days),
            "w" | "week" | "weeks" => Some(Self::Weeks),
            _ => None,
        }
    }

    /// Milliseconds per unit
    pub const fn millis(self) -> i64 {
        match self {
            Self::Milliseconds => 1,
            Self::Seconds => 1_000,
            Self::Minutes => 60_000,
            Self::Hours => 3_600_000,
            Self::Days => 86_400_000,
            Self::Weeks => 604_800_000,
        }
    }
}

/// Parse a duration token into milliseconds
///
/// The input must be `<integer><optional space><unit>` with nothing before or
/// after it. Anything else, including a product that does not fit in an
/// `i64`, is an [`ErrorCode::InvalidFormat`](crate::ErrorCode::InvalidFormat)
/// error carrying the input text.
pub fn parse_duration(text: &str) -> Result<i64> {
    let caps = DURATION_PATTERN
        .captures(text)
        .ok_or_else(|| Error::invalid_duration(text))?;

    let unit = caps
        .get(2)
        .and_then(|m| DurationUnit::from_token(m.as_str()))
        .ok_or_else(|| Error::invalid_duration(text))?;

    let magnitude: i64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| Error::invalid_duration(text))?;

    magnitude
        .checked_mul(unit.millis())
        .ok_or_else(|| Error::invalid_duration(text))
}

/// Parse a duration token into a [`std::time::Duration`]
pub fn parse_std_duration(text: &str) -> Result<Duration> {
    let millis = parse_duration(text)?;
    // The grammar has no sign, so the count is never negative.
    Ok(Duration::from_millis(millis.unsigned_abs()))
}
