//! Digit scanners shared by the duration parser.
//!
//! Both scanners consume a maximal run of ASCII decimal digits from the front
//! of the input and hand back the unconsumed remainder, so the parser never
//! has to re-inspect characters it already walked past.

use crate::unit::MAX_MAGNITUDE;

/// Consumes the leading `[0-9]*` from `input` into an unsigned accumulator.
///
/// Returns `None` if the digit run exceeds a magnitude of `2^63`, which is
/// the largest value the parser can still negate into the signed tick range.
pub(crate) fn leading_int(input: &str) -> Option<(u64, &str)> {
    let mut value: u64 = 0;
    let mut consumed = 0;

    for chr in input.bytes() {
        if !chr.is_ascii_digit() {
            break;
        }

        if value > MAX_MAGNITUDE / 10 {
            return None;
        }

        value = value * 10 + u64::from(chr - b'0');

        if value > MAX_MAGNITUDE {
            return None;
        }

        consumed += 1;
    }

    Some((value, &input[consumed..]))
}

/// Consumes the leading `[0-9]*` from `input` as the digits after a decimal
/// point, returning the accumulated value, a scale of ten to the power of
/// the digits that still fit, and the remainder.
///
/// Unlike [`leading_int`] this never fails. Once the next multiply-and-add
/// would leave the representable range, the accumulator and scale freeze,
/// but the remaining digits are still consumed so the parse position stays
/// correct. Precision past that point is rounded away, not rejected.
pub(crate) fn leading_fraction(input: &str) -> (u64, f64, &str) {
    let mut value: u64 = 0;
    let mut scale = 1f64;
    let mut consumed = 0;
    let mut frozen = false;

    for chr in input.bytes() {
        if !chr.is_ascii_digit() {
            break;
        }
        consumed += 1;

        if frozen {
            continue;
        }

        // A wrapped multiply could still come out positive, so freeze before
        // the multiply instead of checking after it.
        if value > (MAX_MAGNITUDE - 1) / 10 {
            frozen = true;
            continue;
        }

        let next = value * 10 + u64::from(chr - b'0');
        if next > MAX_MAGNITUDE {
            frozen = true;
            continue;
        }

        value = next;
        scale *= 10.0;
    }

    (value, scale, &input[consumed..])
}
