//! Unit letters of the ISO-8601 duration grammar and their resolution into
//! nanosecond tick counts.
//!
//! The grammar reuses the letter `M` for both months and minutes; which one
//! is meant depends solely on whether the token appears before or after the
//! `T` designator. The parser therefore carries an active [`UnitTable`] and
//! switches it exactly once when it crosses the `T`.

use std::fmt::Display;

pub(crate) const NANOS_PER_SECOND: u64 = 1_000_000_000;
pub(crate) const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SECOND;
pub(crate) const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MINUTE;
pub(crate) const NANOS_PER_DAY: u64 = 24 * NANOS_PER_HOUR;

/// The largest magnitude the parse accumulator may reach.
///
/// This is one past [`i64::MAX`]: a total of exactly `2^63` is still
/// representable, but only once the leading sign negates it onto
/// [`i64::MIN`].
pub(crate) const MAX_MAGNITUDE: u64 = 1 << 63;

/// Units valid before the `T` designator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum DateUnit {
    #[strum(serialize = "Y")]
    Years,

    #[strum(serialize = "M")]
    Months,

    #[strum(serialize = "D")]
    Days,
}

/// Units valid after the `T` designator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum TimeUnit {
    #[strum(serialize = "H")]
    Hours,

    #[strum(serialize = "M")]
    Minutes,

    #[strum(serialize = "S")]
    Seconds,
}

/// A unit letter tagged with the grammar section it was read in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationUnit {
    Date(DateUnit),
    Time(TimeUnit),
}

impl Display for DurationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(unit) => write!(f, "{unit}"),
            Self::Time(unit) => write!(f, "{unit}"),
        }
    }
}

impl DurationUnit {
    /// Splits the units into the two resolution strategies: fixed units
    /// carry their nanosecond length, calendar-relative units need a
    /// reference instant to have a length at all.
    pub(crate) fn kind(&self) -> UnitKind {
        match self {
            Self::Date(DateUnit::Years) => UnitKind::Calendar(CalendarUnit::Years),
            Self::Date(DateUnit::Months) => UnitKind::Calendar(CalendarUnit::Months),
            Self::Date(DateUnit::Days) => UnitKind::Fixed(NANOS_PER_DAY),
            Self::Time(TimeUnit::Hours) => UnitKind::Fixed(NANOS_PER_HOUR),
            Self::Time(TimeUnit::Minutes) => UnitKind::Fixed(NANOS_PER_MINUTE),
            Self::Time(TimeUnit::Seconds) => UnitKind::Fixed(NANOS_PER_SECOND),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnitKind {
    Fixed(u64),
    Calendar(CalendarUnit),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CalendarUnit {
    Months,
    Years,
}

/// The active unit lookup table. Starts out as [`UnitTable::Date`] and
/// switches to [`UnitTable::Time`] when the parser crosses the `T`
/// designator. The switch is one-way per parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnitTable {
    Date,
    Time,
}

impl UnitTable {
    pub(crate) fn lookup(self, letter: &str) -> Option<DurationUnit> {
        match self {
            Self::Date => letter.parse().ok().map(DurationUnit::Date),
            Self::Time => letter.parse().ok().map(DurationUnit::Time),
        }
    }
}

/// Resolves a fixed (context-free) unit into a tick count.
///
/// The integer path multiplies `value` by the unit length with a pre-multiply
/// bound check. The fractional path computes `value * (nanos / scale)` in
/// `f64` and checks the product against the magnitude cap before truncating
/// back into the integer domain. Returns `None` on overflow.
pub(crate) fn resolve_fixed(nanos: u64, value: u64, scale: Option<f64>) -> Option<u64> {
    match scale {
        Some(scale) => {
            let resolved = value as f64 * (nanos as f64 / scale);
            if resolved > MAX_MAGNITUDE as f64 {
                return None;
            }

            Some(resolved as u64)
        }
        None => {
            if value > MAX_MAGNITUDE / nanos {
                return None;
            }

            Some(value * nanos)
        }
    }
}
