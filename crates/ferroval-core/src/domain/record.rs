use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::scalar::SeriesValue;

/// A single dated valuation.
///
/// Equality is structural: two records are equal only when both day and
/// value match. Ordering is by day alone, through [`Valuation::cmp_by_day`],
/// so records on the same day with different values are order-equal without
/// being equal. That is a pre-order, not a total order, which is why the
/// type exposes a named comparator instead of implementing `PartialOrd`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation<V> {
    #[serde(with = "day_text")]
    pub day: Date,
    pub value: V,
}

/// ISO `yyyy-mm-dd` text for the `day` field, fixed regardless of the
/// serializer's own date representation.
mod day_text {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::BorrowedFormatItem;
    use time::macros::format_description;
    use time::Date;

    const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(day: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = day.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, FORMAT).map_err(DeError::custom)
    }
}

impl<V: SeriesValue> Valuation<V> {
    pub fn new(day: Date, value: V) -> Self {
        Self { day, value }
    }

    /// Record carrying the zero value on `day`.
    pub fn zero(day: Date) -> Self {
        Self::new(day, V::zero())
    }

    /// Orders by day only; values do not participate.
    pub fn cmp_by_day(&self, other: &Self) -> Ordering {
        self.day.cmp(&other.day)
    }
}

impl<V: SeriesValue> Display for Valuation<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.day, self.value)
    }
}
