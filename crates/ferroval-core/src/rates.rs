//! Aggregates and growth rates over valuation snapshots.

use crate::domain::{SeriesValue, Valuation};

/// Day-count convention used to annualize growth rates.
///
/// The default 365-day year reproduces the rates in historical reports;
/// callers wanting a 365.25-day or trading-day year pass their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateConvention {
    pub days_per_year: f64,
}

impl Default for RateConvention {
    fn default() -> Self {
        Self {
            days_per_year: 365.0,
        }
    }
}

/// Arithmetic sum of every value in the snapshot; an empty snapshot sums to
/// zero. Duplicate days contribute once per record.
pub fn total<V: SeriesValue>(snapshot: &[Valuation<V>]) -> V {
    snapshot
        .iter()
        .fold(V::zero(), |sum, record| sum + record.value)
}

/// Compound annual rate of growth between two realized valuations.
///
/// The value ratio is taken in the scalar's own arithmetic and only then
/// widened to `f64` for exponentiation; a quotient too large for the
/// scalar is taken over the widened f64 views instead. A zero earlier
/// value yields NaN rather than attempting the division; a reversed or
/// zero day span propagates through `powf` as NaN or an extreme rate,
/// matching how the inputs are out of domain.
pub fn compound_annual_rate<V: SeriesValue>(
    earlier: &Valuation<V>,
    later: &Valuation<V>,
    convention: RateConvention,
) -> f64 {
    if earlier.value.is_zero() {
        return f64::NAN;
    }

    let ratio = later.value.ratio_f64(earlier.value);
    let day_span = (later.day - earlier.day).whole_days() as f64;
    ratio.powf(convention.days_per_year / day_span) - 1.0
}
