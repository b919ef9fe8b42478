use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Scalar contract the series container is generic over.
///
/// Covers the arithmetic the interpolation and rate engines need, the
/// culture-invariant wire text, and two domain sentinels: the zero default
/// filled in for unreadable input, and the capped reciprocal used when a
/// series is inverted.
pub trait SeriesValue:
    Copy
    + Debug
    + Display
    + PartialEq
    + PartialOrd
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + 'static
{
    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative inverse. Zero maps to the largest representable value
    /// rather than an infinity the scalar may not have.
    fn reciprocal(self) -> Self;

    /// Whole day count as a scalar, for interpolation ratios.
    fn from_day_count(days: i64) -> Self;

    /// Lossy `f64` view used by the rate engine.
    fn as_f64(self) -> f64;

    /// Ratio `self / divisor`, widened to `f64` for the rate engine. Taken
    /// in the scalar's own arithmetic when the quotient fits, over the
    /// widened views when it does not.
    fn ratio_f64(self, divisor: Self) -> f64 {
        (self / divisor).as_f64()
    }

    /// `self - other`, `None` when the difference exceeds the scalar's
    /// range. Scalars that carry infinities never refuse.
    fn checked_sub(self, other: Self) -> Option<Self> {
        Some(self - other)
    }

    /// Culture-invariant wire text. Must round-trip through
    /// [`SeriesValue::parse_wire`].
    fn format_wire(self) -> String;

    /// Parses wire text; `None` signals malformed input for the caller's
    /// default-fill policy to absorb.
    fn parse_wire(text: &str) -> Option<Self>;

    fn is_zero(self) -> bool {
        self == Self::zero()
    }
}

impl SeriesValue for Decimal {
    fn zero() -> Self {
        Decimal::ZERO
    }

    fn reciprocal(self) -> Self {
        if self.is_zero() {
            Decimal::MAX
        } else {
            Decimal::ONE / self
        }
    }

    fn from_day_count(days: i64) -> Self {
        Decimal::from(days)
    }

    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    fn ratio_f64(self, divisor: Self) -> f64 {
        match self.checked_div(divisor) {
            Some(ratio) => ratio.as_f64(),
            None => self.as_f64() / divisor.as_f64(),
        }
    }

    fn checked_sub(self, other: Self) -> Option<Self> {
        Decimal::checked_sub(self, other)
    }

    fn format_wire(self) -> String {
        self.to_string()
    }

    fn parse_wire(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl SeriesValue for f64 {
    fn zero() -> Self {
        0.0
    }

    fn reciprocal(self) -> Self {
        if self == 0.0 {
            f64::MAX
        } else {
            1.0 / self
        }
    }

    fn from_day_count(days: i64) -> Self {
        days as f64
    }

    fn as_f64(self) -> f64 {
        self
    }

    // The special values use the spelled-out forms older persisted files
    // contain, not Rust's "inf".
    fn format_wire(self) -> String {
        if self.is_nan() {
            String::from("NaN")
        } else if self == f64::INFINITY {
            String::from("Infinity")
        } else if self == f64::NEG_INFINITY {
            String::from("-Infinity")
        } else {
            self.to_string()
        }
    }

    fn parse_wire(text: &str) -> Option<Self> {
        match text.trim() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        }
    }
}
