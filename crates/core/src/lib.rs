//! Core value types shared by the platform add-ons client
//!
//! This crate holds the pieces of the client that carry real parsing rules:
//!
//! - **Durations**: `"14d"`, `"90 minutes"` and friends converted to milliseconds
//! - **Timestamps**: multi-layout decoding with one canonical encoding
//! - **Error handling**: coded errors with context and recovery suggestions
//!
//! # Example
//!
//! ```rust
//! use addons_core::{duration::parse_duration, timestamp::FlexibleTimestamp};
//!
//! let retention = parse_duration("7d").unwrap();
//! assert_eq!(retention, 604_800_000);
//!
//! let created: FlexibleTimestamp = "2024-07-31 01:16:17 UTC".parse().unwrap();
//! assert!(created.is_set());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod duration;
pub mod error;
pub mod timestamp;

pub use duration::{parse_duration, DurationUnit};
pub use error::{Error, ErrorCode, ErrorReport, Result, ResultExt};
pub use timestamp::FlexibleTimestamp;
