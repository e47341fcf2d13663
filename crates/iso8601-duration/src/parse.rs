//! The ISO-8601 duration parser.
//!
//! Parsing walks the input left to right, one `<digits> [. <digits>] <unit>`
//! token at a time, and accumulates every resolved token into an unsigned
//! running magnitude. Fixed units (days, hours, minutes, seconds) resolve
//! context-free. Months and years have no fixed length and resolve against a
//! reference instant instead, which advances after every whole calendar
//! token so that `P1M1M` measures the second month from where the first one
//! ended.

use jiff::{civil::DateTime, SignedDuration, Span, Zoned};
use snafu::{ensure, OptionExt, Snafu};
use tracing::trace;

use crate::{
    duration::Duration,
    scan::{leading_fraction, leading_int},
    unit::{CalendarUnit, UnitKind, UnitTable, MAX_MAGNITUDE},
};

/// Errors which can occur when parsing an ISO-8601 duration string. Every
/// variant carries the offending input for diagnostics; parsing aborts on
/// the first structural violation and never produces a partial result.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(module)]
pub enum DurationParseError {
    #[snafu(display("invalid duration format {input:?}"))]
    InvalidFormat { input: String },

    #[snafu(display("value without a unit letter in {input:?}"))]
    MissingUnit { input: String },

    #[snafu(display("unknown unit {unit:?} in {input:?}"))]
    UnknownUnit { unit: String, input: String },

    #[snafu(display("duration magnitude overflows in {input:?}"))]
    Overflow { input: String },

    #[snafu(display("integer component overflows in {input:?}"))]
    LeadingIntOverflow { input: String },
}

/// Parses ISO-8601 duration strings of the form `P(n)Y(n)M(n)DT(n)H(n)M(n)S`.
///
/// The only configuration is the provider of the reference instant used to
/// resolve calendar-relative units (months and years). It defaults to the
/// current wall-clock time and is invoked at most once per parse, when the
/// first calendar token is encountered.
pub struct DurationParser {
    reference: Box<dyn Fn() -> DateTime>,
}

impl Default for DurationParser {
    fn default() -> Self {
        Self {
            reference: Box::new(|| Zoned::now().datetime()),
        }
    }
}

impl std::fmt::Debug for DurationParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurationParser").finish_non_exhaustive()
    }
}

impl DurationParser {
    /// Creates a parser which resolves months and years against the current
    /// wall-clock time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser which resolves months and years against the instant
    /// supplied by `reference`.
    ///
    /// The provider must be deterministic for the duration of a single
    /// parse. Calendar tokens are resolved sequentially, each one against
    /// the instant produced by the previous one, so a provider with hidden
    /// state would break that chain.
    pub fn with_reference<F>(reference: F) -> Self
    where
        F: Fn() -> DateTime + 'static,
    {
        Self {
            reference: Box::new(reference),
        }
    }

    /// Parses `input` into a [`Duration`].
    ///
    /// The accepted grammar is
    /// `["-"|"+"] "P" {digits ["." digits] unit} ["T" {digits ["." digits] unit}]`
    /// with `Y`, `M` (months) and `D` before the `T` and `H`, `M` (minutes)
    /// and `S` after it. The leading sign is captured once and applied to
    /// the final magnitude.
    pub fn parse(&self, input: &str) -> Result<Duration, DurationParseError> {
        use duration_parse_error::*;

        let mut s = input;
        let mut negative = false;

        if let Some(first) = s.chars().next() {
            if first == '-' || first == '+' {
                negative = first == '-';
                s = &s[1..];
            }
        }

        let Some(mut s) = s.strip_prefix('P') else {
            return InvalidFormatSnafu { input }.fail();
        };

        let mut total: u64 = 0;
        let mut table = UnitTable::Date;
        let mut calendar = CalendarContext::new(self.reference.as_ref());
        let mut any_token = false;

        while !s.is_empty() {
            if let Some(rest) = s.strip_prefix('T') {
                // One-way switch; everything after the designator is a time
                // unit, including a second `M` now meaning minutes.
                table = UnitTable::Time;
                s = rest;
                ensure!(!s.is_empty(), InvalidFormatSnafu { input });
            }

            let next = s.as_bytes()[0];
            ensure!(
                next == b'.' || next.is_ascii_digit(),
                InvalidFormatSnafu { input }
            );

            // Integer digits before any decimal point.
            let (value, rest) = leading_int(s).context(LeadingIntOverflowSnafu { input })?;
            let has_int_digits = rest.len() != s.len();
            s = rest;

            // Fraction digits after a decimal point.
            let mut fraction = 0;
            let mut scale = 1f64;
            let mut has_fraction_digits = false;

            if let Some(rest) = s.strip_prefix('.') {
                let (parsed, parsed_scale, remainder) = leading_fraction(rest);
                fraction = parsed;
                scale = parsed_scale;
                has_fraction_digits = remainder.len() != rest.len();
                s = remainder;
            }

            // A bare "." or a unit letter with no digits at all is invalid.
            ensure!(
                has_int_digits || has_fraction_digits,
                InvalidFormatSnafu { input }
            );

            // The unit letter run ends at the next digit, decimal point or
            // the time designator.
            let end = s
                .find(|chr: char| chr == '.' || chr == 'T' || chr.is_ascii_digit())
                .unwrap_or(s.len());
            ensure!(end != 0, MissingUnitSnafu { input });

            let (letter, rest) = s.split_at(end);
            s = rest;

            let unit = table
                .lookup(letter)
                .context(UnknownUnitSnafu { unit: letter, input })?;

            // Whole part first, then the fractional remainder with its
            // scale; both go through the same resolution strategy.
            let mut ticks = match unit.kind() {
                UnitKind::Fixed(nanos) => crate::unit::resolve_fixed(nanos, value, None),
                UnitKind::Calendar(calendar_unit) => calendar.resolve(calendar_unit, value, None),
            }
            .context(OverflowSnafu { input })?;

            if fraction > 0 {
                let resolved = match unit.kind() {
                    UnitKind::Fixed(nanos) => {
                        crate::unit::resolve_fixed(nanos, fraction, Some(scale))
                    }
                    UnitKind::Calendar(calendar_unit) => {
                        calendar.resolve(calendar_unit, fraction, Some(scale))
                    }
                }
                .context(OverflowSnafu { input })?;
                trace!(%unit, fraction, scale, resolved, "resolved fractional component");

                ticks = ticks.checked_add(resolved).context(OverflowSnafu { input })?;
            }

            ensure!(
                ticks <= MAX_MAGNITUDE && total <= MAX_MAGNITUDE - ticks,
                OverflowSnafu { input }
            );
            total += ticks;
            any_token = true;
        }

        // "P" or "-PT" carry no unit content at all.
        ensure!(any_token, InvalidFormatSnafu { input });

        if negative {
            // A magnitude of exactly 2^63 only exists on the negative side;
            // the wrapping negation maps it onto i64::MIN.
            return Ok(Duration::from_nanos((total as i64).wrapping_neg()));
        }

        ensure!(total < MAX_MAGNITUDE, OverflowSnafu { input });
        Ok(Duration::from_nanos(total as i64))
    }
}

/// The reference instant threaded through a single parse.
///
/// The provider is only invoked once the first calendar token shows up;
/// durations made of fixed units never touch the wall clock. After each
/// whole month/year token the instant moves to the end of the span it
/// resolved, which makes calendar tokens deliberately order-sensitive.
struct CalendarContext<'a> {
    provider: &'a dyn Fn() -> DateTime,
    reference: Option<DateTime>,
}

impl<'a> CalendarContext<'a> {
    fn new(provider: &'a dyn Fn() -> DateTime) -> Self {
        Self {
            provider,
            reference: None,
        }
    }

    /// Resolves `value` months or years into ticks. Returns `None` when the
    /// value or the resulting instant leaves the representable range.
    fn resolve(&mut self, unit: CalendarUnit, value: u64, scale: Option<f64>) -> Option<u64> {
        let from = *self.reference.get_or_insert_with(|| (self.provider)());

        match scale {
            Some(scale) => {
                // Fractional months/years scale the length of a single unit
                // measured at the current reference instant. The instant
                // does not advance for fractional remainders.
                let nanos = Self::elapsed(from, unit, 1)?;
                let resolved = value as f64 * (nanos as f64 / scale);
                if resolved > MAX_MAGNITUDE as f64 {
                    return None;
                }

                Some(resolved as u64)
            }
            None => {
                let ticks = Self::elapsed(from, unit, i64::try_from(value).ok()?)?;
                let advanced = from
                    .checked_add(SignedDuration::from_nanos(i64::try_from(ticks).ok()?))
                    .ok()?;

                trace!(from = %from, to = %advanced, ?unit, value, "advanced reference instant");
                self.reference = Some(advanced);

                Some(ticks)
            }
        }
    }

    /// The externally supplied calendar primitive: add `value` units to
    /// `from` and measure the elapsed ticks.
    fn elapsed(from: DateTime, unit: CalendarUnit, value: i64) -> Option<u64> {
        let span = match unit {
            CalendarUnit::Months => Span::new().try_months(value).ok()?,
            CalendarUnit::Years => Span::new().try_years(value).ok()?,
        };

        let to = from.checked_add(span).ok()?;
        u64::try_from(from.duration_until(to).as_nanos()).ok()
    }
}

#[cfg(test)]
mod test {
    use jiff::civil::datetime;
    use rstest::rstest;

    use super::*;
    use crate::unit::NANOS_PER_DAY;

    fn parse(input: &str) -> Result<Duration, DurationParseError> {
        DurationParser::new().parse(input)
    }

    fn parse_at(input: &str, reference: DateTime) -> Result<Duration, DurationParseError> {
        DurationParser::with_reference(move || reference).parse(input)
    }

    #[rstest]
    #[case("PT0S", Duration::ZERO)]
    #[case("P0D", Duration::ZERO)]
    #[case("P1D", Duration::from_days(1))]
    #[case("+P1D", Duration::from_days(1))]
    #[case("-P1D", Duration::from_days(-1))]
    #[case("PT1S", Duration::from_secs(1))]
    #[case("PT0.000000001S", Duration::from_nanos(1))]
    #[case("PT0.2S", Duration::from_millis(200))]
    #[case("-PT0.5S", Duration::from_millis(-500))]
    #[case("P1DT1H", Duration::from_hours(25))]
    #[case("PT12H30M17S", Duration::from_secs(12 * 3600 + 30 * 60 + 17))]
    #[case("P10DT12H30M17S", Duration::from_secs(252 * 3600 + 30 * 60 + 17))]
    #[case("PT12H30.5M", Duration::from_secs(12 * 3600 + 30 * 60 + 30))]
    #[case("P0.5D", Duration::from_hours(12))]
    #[case("P1.5D", Duration::from_hours(36))]
    #[case("PT1M1M", Duration::from_mins(2))]
    fn parse_fixed_units_pass(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse(input).unwrap(), expected);
    }

    #[rstest]
    #[case("", DurationParseError::InvalidFormat { input: "".into() })]
    #[case("-", DurationParseError::InvalidFormat { input: "-".into() })]
    #[case("1D", DurationParseError::InvalidFormat { input: "1D".into() })]
    #[case("p1D", DurationParseError::InvalidFormat { input: "p1D".into() })]
    #[case("P", DurationParseError::InvalidFormat { input: "P".into() })]
    #[case("-P", DurationParseError::InvalidFormat { input: "-P".into() })]
    #[case("PT", DurationParseError::InvalidFormat { input: "PT".into() })]
    #[case("P1DT", DurationParseError::InvalidFormat { input: "P1DT".into() })]
    #[case("P.D", DurationParseError::InvalidFormat { input: "P.D".into() })]
    #[case("P1", DurationParseError::MissingUnit { input: "P1".into() })]
    #[case("PT5", DurationParseError::MissingUnit { input: "PT5".into() })]
    #[case("P1W", DurationParseError::UnknownUnit { unit: "W".into(), input: "P1W".into() })]
    #[case("P1H", DurationParseError::UnknownUnit { unit: "H".into(), input: "P1H".into() })]
    #[case("PT1D", DurationParseError::UnknownUnit { unit: "D".into(), input: "PT1D".into() })]
    #[case("PT1MS", DurationParseError::UnknownUnit { unit: "MS".into(), input: "PT1MS".into() })]
    fn parse_malformed_fail(#[case] input: &str, #[case] expected: DurationParseError) {
        assert_eq!(parse(input).unwrap_err(), expected);
    }

    #[rstest]
    #[case("P106752D")]
    #[case("P106751DT24H")]
    #[case("PT9223372036.854775808S")]
    fn parse_overflow_fail(#[case] input: &str) {
        assert_eq!(
            parse(input).unwrap_err(),
            DurationParseError::Overflow {
                input: input.into()
            }
        );
    }

    #[test]
    fn parse_leading_int_overflow_fail() {
        assert_eq!(
            parse("PT9999999999999999999999S").unwrap_err(),
            DurationParseError::LeadingIntOverflow {
                input: "PT9999999999999999999999S".into()
            }
        );
    }

    // A magnitude of exactly 2^63 only fits once the sign negates it onto
    // i64::MIN; one tick less is the largest positive duration.
    #[test]
    fn parse_signed_boundary() {
        assert_eq!(parse("PT9223372036.854775807S").unwrap(), Duration::MAX);
        assert_eq!(parse("-PT9223372036.854775808S").unwrap(), Duration::MIN);
        assert_eq!(
            parse("-P106751DT23H47M16.854775808S").unwrap(),
            Duration::MIN
        );
    }

    #[test]
    fn parse_fraction_precision_loss_is_silent() {
        // Digits beyond the representable precision are consumed but
        // rounded away.
        assert_eq!(
            parse("PT0.1234567891234S").unwrap(),
            Duration::from_nanos(123_456_789)
        );
    }

    #[rstest]
    #[case("P1M", datetime(2024, 1, 1, 0, 0, 0, 0), 31)]
    #[case("P1M", datetime(2024, 2, 1, 0, 0, 0, 0), 29)]
    #[case("P1M", datetime(2023, 2, 1, 0, 0, 0, 0), 28)]
    #[case("P2M", datetime(2024, 1, 1, 0, 0, 0, 0), 60)]
    #[case("P1Y", datetime(2024, 1, 1, 0, 0, 0, 0), 366)]
    #[case("P1Y", datetime(2023, 1, 1, 0, 0, 0, 0), 365)]
    #[case("P1Y1M1D", datetime(2020, 1, 1, 0, 0, 0, 0), 398)]
    fn parse_calendar_units_pass(
        #[case] input: &str,
        #[case] reference: DateTime,
        #[case] days: i64,
    ) {
        assert_eq!(
            parse_at(input, reference).unwrap(),
            Duration::from_days(days)
        );
    }

    // `P1M1M` measures the second month from where the first one ended, so
    // it equals `P2M` anchored at the same instant.
    #[test]
    fn parse_calendar_units_advance_sequentially() {
        let reference = datetime(2024, 1, 1, 0, 0, 0, 0);

        assert_eq!(
            parse_at("P1M1M", reference).unwrap(),
            parse_at("P2M", reference).unwrap()
        );
        assert_eq!(
            parse_at("P1M1M", reference).unwrap(),
            Duration::from_days(31 + 29)
        );
    }

    #[rstest]
    #[case("P0.5M", datetime(2024, 1, 1, 0, 0, 0, 0), 31 * NANOS_PER_DAY as i64 / 2)]
    #[case("P0.5Y", datetime(2023, 1, 1, 0, 0, 0, 0), 365 * NANOS_PER_DAY as i64 / 2)]
    fn parse_fractional_calendar_units_pass(
        #[case] input: &str,
        #[case] reference: DateTime,
        #[case] nanos: i64,
    ) {
        assert_eq!(
            parse_at(input, reference).unwrap(),
            Duration::from_nanos(nanos)
        );
    }

    #[test]
    fn parse_mixed_calendar_and_fixed_units() {
        // 3 years from 2006-01-02 cross one leap day (1096 days), the six
        // months Jan-Jul 2009 add 181, plus 4 days and the time section.
        let duration = parse_at(
            "P3Y6M4DT12H30M17S",
            datetime(2006, 1, 2, 15, 4, 5, 0),
        )
        .unwrap();

        assert_eq!(
            duration,
            Duration::from_days(1281) + Duration::from_secs(12 * 3600 + 30 * 60 + 17)
        );
    }

    // Month and year lengths depend on the anchor; a window starting in
    // July catches the longer second half of the year.
    #[test]
    fn parse_is_sensitive_to_the_reference_instant() {
        let input = "P3Y6M4DT12H30M17S";
        let at_january = parse_at(input, datetime(1970, 1, 1, 0, 0, 0, 0)).unwrap();
        let at_july = parse_at(input, datetime(1970, 7, 1, 0, 0, 0, 0)).unwrap();

        assert!(at_january < at_july);
        assert_eq!(at_july - at_january, Duration::from_days(3));
    }

    #[test]
    fn parse_huge_calendar_value_fails() {
        assert_eq!(
            parse_at("P100000000Y", datetime(2024, 1, 1, 0, 0, 0, 0)).unwrap_err(),
            DurationParseError::Overflow {
                input: "P100000000Y".into()
            }
        );
    }

    // The default provider is only consulted for calendar units, so the
    // result is bounded by the shortest and longest possible year.
    #[test]
    fn parse_with_default_reference() {
        let year = DurationParser::new().parse("P1Y").unwrap();

        assert!(year >= Duration::from_days(365));
        assert!(year <= Duration::from_days(366));
    }
}

