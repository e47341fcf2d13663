//! The [`Duration`] type: a signed 64-bit count of elapsed nanoseconds,
//! together with its canonical ISO-8601 rendering.
//!
//! A tick count carries no calendar context, so the [`Display`]
//! implementation only ever emits days, hours, minutes and seconds; months
//! and years cannot be re-derived from it. Parsing is the job of
//! [`DurationParser`][crate::DurationParser], with [`FromStr`] wired to a
//! parser using the default (current-instant) reference provider.

use std::{
    fmt::Display,
    num::TryFromIntError,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use crate::{
    parse::{DurationParseError, DurationParser},
    unit::{NANOS_PER_DAY, NANOS_PER_HOUR, NANOS_PER_MINUTE, NANOS_PER_SECOND},
};

/// A signed, nanosecond-precision elapsed time.
///
/// The representable range is exactly the signed 64-bit nanosecond range,
/// roughly ±292 years. Arithmetic which would leave that range is reported
/// as an error during parsing and as a panic by the operator impls, never
/// as a silent wraparound.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(i64);

impl Duration {
    pub const MAX: Self = Self(i64::MAX);
    pub const MIN: Self = Self(i64::MIN);
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Duration`] from a signed number of nanosecond ticks.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros * 1_000)
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1_000_000)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * NANOS_PER_SECOND as i64)
    }

    pub const fn from_mins(mins: i64) -> Self {
        Self(mins * NANOS_PER_MINUTE as i64)
    }

    pub const fn from_hours(hours: i64) -> Self {
        Self(hours * NANOS_PER_HOUR as i64)
    }

    pub const fn from_days(days: i64) -> Self {
        Self(days * NANOS_PER_DAY as i64)
    }

    /// Returns the total number of nanosecond ticks.
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Returns the number of whole seconds, truncating towards zero.
    pub const fn as_secs(&self) -> i64 {
        self.0 / NANOS_PER_SECOND as i64
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / NANOS_PER_SECOND as f64
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(nanos) => Some(Self(nanos)),
            None => None,
        }
    }

    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(nanos) => Some(Self(nanos)),
            None => None,
        }
    }

    pub const fn checked_mul(self, rhs: i64) -> Option<Self> {
        match self.0.checked_mul(rhs) {
            Some(nanos) => Some(Self(nanos)),
            None => None,
        }
    }

    /// The absolute value, clamped to [`Duration::MAX`] for
    /// [`Duration::MIN`] whose magnitude has no positive counterpart.
    pub const fn saturating_abs(self) -> Self {
        Self(self.0.saturating_abs())
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DurationParser::new().parse(s)
    }
}

/// Formats the duration in its canonical ISO-8601 form.
///
/// The rendering is unique per tick count: zero-valued units are omitted,
/// fractional seconds carry no trailing zeros, and the zero duration is the
/// literal `PT0S`. Units are discovered least-significant-first, so the
/// buffer fills from the end backward.
impl Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == 0 {
            return f.write_str("PT0S");
        }

        // Longest rendering is -P106751DT23H47M16.854775808S (29 bytes).
        let mut buf = [0u8; 32];
        let mut w = buf.len();
        let mut u = self.0.unsigned_abs();

        w -= 1;
        buf[w] = b'S';
        (w, u) = fmt_frac(&mut buf, w, u, 9);

        // u is now whole seconds.
        w = fmt_int(&mut buf, w, u % 60);

        // Drop a lone "0S" again when a higher unit will be rendered; only
        // the zero duration keeps it, and that case returned early.
        if u % 60 == 0 && w + 2 == buf.len() {
            w += 2;
        }
        u /= 60;

        if u > 0 {
            if u % 60 > 0 {
                w -= 1;
                buf[w] = b'M';
                w = fmt_int(&mut buf, w, u % 60);
            }
            u /= 60;

            if u > 0 && u % 24 > 0 {
                w -= 1;
                buf[w] = b'H';
                w = fmt_int(&mut buf, w, u % 24);
            }
            u /= 24;
        }

        // The designator is emitted whenever any time-section unit was.
        if w != buf.len() {
            w -= 1;
            buf[w] = b'T';
        }

        if u > 0 {
            w -= 1;
            buf[w] = b'D';
            w = fmt_int(&mut buf, w, u);
        }

        w -= 1;
        buf[w] = b'P';

        if self.0 < 0 {
            w -= 1;
            buf[w] = b'-';
        }

        f.write_str(std::str::from_utf8(&buf[w..]).map_err(|_| std::fmt::Error)?)
    }
}

/// Renders `v` backward into `buf` ending just before `w`, returning the new
/// write position.
fn fmt_int(buf: &mut [u8], mut w: usize, mut v: u64) -> usize {
    if v == 0 {
        w -= 1;
        buf[w] = b'0';
    } else {
        while v > 0 {
            w -= 1;
            buf[w] = b'0' + (v % 10) as u8;
            v /= 10;
        }
    }

    w
}

/// Renders the fractional part of `v` (the lowest `prec` decimal digits)
/// backward into `buf`, suppressing trailing zeros up to and including the
/// decimal point. Returns the new write position and `v` stripped of its
/// fractional digits.
fn fmt_frac(buf: &mut [u8], mut w: usize, mut v: u64, prec: usize) -> (usize, u64) {
    let mut printing = false;

    for _ in 0..prec {
        let digit = v % 10;
        printing = printing || digit != 0;
        if printing {
            w -= 1;
            buf[w] = b'0' + digit as u8;
        }
        v /= 10;
    }

    if printing {
        w -= 1;
        buf[w] = b'.';
    }

    (w, v)
}

impl TryFrom<std::time::Duration> for Duration {
    type Error = TryFromIntError;

    fn try_from(value: std::time::Duration) -> Result<Self, Self::Error> {
        Ok(Self(i64::try_from(value.as_nanos())?))
    }
}

impl TryFrom<Duration> for std::time::Duration {
    type Error = TryFromIntError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Ok(Self::from_nanos(u64::try_from(value.0)?))
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0.add_assign(rhs.0);
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0.sub_assign(rhs.0);
    }
}

impl Neg for Duration {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Duration {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for Duration {
    type Output = Self;

    fn div(self, rhs: i64) -> Self::Output {
        Self(self.0 / rhs)
    }
}
