use std::num::TryFromIntError;
use std::ops::{Add, Sub};

use jiff::{civil::DateTime, SignedDuration};

use crate::Duration;

impl From<Duration> for SignedDuration {
    fn from(value: Duration) -> Self {
        Self::from_nanos(value.as_nanos())
    }
}

impl TryFrom<SignedDuration> for Duration {
    type Error = TryFromIntError;

    fn try_from(value: SignedDuration) -> Result<Self, Self::Error> {
        Ok(Self::from_nanos(i64::try_from(value.as_nanos())?))
    }
}

impl Add<Duration> for DateTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self.add(SignedDuration::from(rhs))
    }
}

impl Sub<Duration> for DateTime {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        self.sub(SignedDuration::from(rhs))
    }
}
