//! Parsing and formatting of ISO-8601 durations of the form
//! `P(n)Y(n)M(n)DT(n)H(n)M(n)S`, backed by a signed 64-bit nanosecond tick
//! count.
//!
//! Fixed units (days, hours, minutes, fractional seconds) convert
//! context-free. Months and years have no fixed length; they are resolved
//! against a reference instant using jiff's civil calendar arithmetic, and
//! each resolved calendar token advances that instant so multi-unit strings
//! like `P3Y6M` measure the months from where the years ended.
//!
//! ```
//! use iso8601_duration::{Duration, DurationParser};
//! use jiff::civil::datetime;
//!
//! let duration: Duration = "P10DT12H30M17S".parse()?;
//! assert_eq!(duration.to_string(), "P10DT12H30M17S");
//!
//! // Month and year lengths depend on where on the calendar they start.
//! let parser = DurationParser::with_reference(|| datetime(2024, 1, 1, 0, 0, 0, 0));
//! assert_eq!(parser.parse("P1M")?, Duration::from_days(31));
//! # Ok::<(), iso8601_duration::DurationParseError>(())
//! ```
//!
//! Formatting via [`Display`][std::fmt::Display] always produces the
//! canonical zero-suppressed rendering and never emits months or years,
//! because a bare tick count carries no calendar context to re-derive them.

mod duration;
mod jiff_impl;
mod parse;
mod scan;
mod serde_impl;
mod unit;

pub use duration::Duration;
pub use parse::{DurationParseError, DurationParser};
pub use unit::{DateUnit, DurationUnit, TimeUnit};
