//! Boundary and interpolation queries over a sorted snapshot.
//!
//! Every function here is pure: it walks an already-copied snapshot and
//! never touches the store's lock. Snapshots are assumed non-decreasing by
//! day; duplicate days (possible through the legacy append path) are
//! tolerated everywhere.
//!
//! Out-of-range behavior differs deliberately between the lookups.
//! [`value_on_or_before`] yields `None` for a date before the first record,
//! while [`value_before`] yields a zero-valued record dated at the query
//! date for the same input. Both shapes appear in long-lived persisted
//! reports, so neither may change.

use time::Date;

use crate::domain::{SeriesValue, Valuation};

/// Interpolating lookup with the default policies: flat extension on both
/// sides of the recorded range, straight-line interpolation inside it.
///
/// `None` only when the snapshot is empty.
pub fn value<V: SeriesValue>(snapshot: &[Valuation<V>], date: Date) -> Option<Valuation<V>> {
    value_with(snapshot, date, prior_flat, post_flat, interpolate_linear)
}

/// The same search with caller-supplied policies.
///
/// `prior` shapes the result for a date before the first record, `post` for
/// a date on or after the last, and `interpolate` receives the two records
/// straddling an in-range date. Only one of the three runs per call.
pub fn value_with<V, P, Q, I>(
    snapshot: &[Valuation<V>],
    date: Date,
    prior: P,
    post: Q,
    interpolate: I,
) -> Option<Valuation<V>>
where
    V: SeriesValue,
    P: FnOnce(&Valuation<V>, Date) -> Valuation<V>,
    Q: FnOnce(&Valuation<V>, Date) -> Valuation<V>,
    I: FnOnce(&Valuation<V>, &Valuation<V>, Date) -> Valuation<V>,
{
    let first = snapshot.first()?;
    let last = snapshot.last()?;

    if date < first.day {
        return Some(prior(first, date));
    }
    if date >= last.day {
        return Some(post(last, date));
    }

    let (lower, upper) = bracket(snapshot, date)?;
    Some(interpolate(&snapshot[lower], &snapshot[upper], date))
}

/// Interpolating lookup that treats dates before the first record as a zero
/// holding: [`value`] with [`prior_zero`] in place of [`prior_flat`].
pub fn value_zero_before<V: SeriesValue>(
    snapshot: &[Valuation<V>],
    date: Date,
) -> Option<Valuation<V>> {
    value_with(snapshot, date, prior_zero, post_flat, interpolate_linear)
}

/// Latest record on or before `date`, as stored. A step function with no
/// interpolation; `None` when the snapshot is empty or `date` precedes the
/// first record.
pub fn value_on_or_before<V: SeriesValue>(
    snapshot: &[Valuation<V>],
    date: Date,
) -> Option<Valuation<V>> {
    let first = snapshot.first()?;
    let last = snapshot.last()?;

    if date < first.day {
        return None;
    }
    if date >= last.day {
        return Some(*last);
    }

    // Reverse scan rather than bracket search: on a tie date the
    // latest-positioned record must win, and duplicate days make that
    // ordering observable.
    snapshot.iter().rev().find(|record| record.day <= date).copied()
}

/// Latest record strictly before `date`. Unlike [`value_on_or_before`], an
/// empty snapshot or a date on or before the first record yields a
/// zero-valued record dated `date`, never `None`.
pub fn value_before<V: SeriesValue>(snapshot: &[Valuation<V>], date: Date) -> Valuation<V> {
    snapshot
        .iter()
        .rev()
        .find(|record| record.day < date)
        .copied()
        .unwrap_or_else(|| Valuation::zero(date))
}

/// Earliest record strictly after `date`: the first record when `date`
/// precedes the whole range, `None` once `date` reaches the last record's
/// day or the snapshot is empty.
pub fn value_after<V: SeriesValue>(snapshot: &[Valuation<V>], date: Date) -> Option<Valuation<V>> {
    let first = snapshot.first()?;
    let last = snapshot.last()?;

    if date < first.day {
        return Some(*first);
    }
    if date >= last.day {
        return None;
    }

    snapshot.iter().find(|record| record.day > date).copied()
}

/// Prior-boundary policy of [`value`]: the first record, unchanged.
pub fn prior_flat<V: SeriesValue>(first: &Valuation<V>, _date: Date) -> Valuation<V> {
    *first
}

/// Prior-boundary policy of [`value_zero_before`]: a zero record dated at
/// the query date, the "no holding before its first valuation" convention.
pub fn prior_zero<V: SeriesValue>(_first: &Valuation<V>, date: Date) -> Valuation<V> {
    Valuation::zero(date)
}

/// Post-boundary policy shared by the built-in lookups: the last record,
/// unchanged.
pub fn post_flat<V: SeriesValue>(last: &Valuation<V>, _date: Date) -> Valuation<V> {
    *last
}

/// Straight-line interpolation between the bracket records, weighted by
/// whole days elapsed.
///
/// A degenerate bracket of two records on the same day returns the earlier
/// record's value at the query date instead of dividing by the zero span;
/// a value step too large for the scalar holds the earlier value the same
/// way.
pub fn interpolate_linear<V: SeriesValue>(
    earlier: &Valuation<V>,
    later: &Valuation<V>,
    date: Date,
) -> Valuation<V> {
    let span = (later.day - earlier.day).whole_days();
    if span == 0 {
        return Valuation::new(date, earlier.value);
    }

    let Some(step) = later.value.checked_sub(earlier.value) else {
        return Valuation::new(date, earlier.value);
    };

    let elapsed = (date - earlier.day).whole_days();
    let gradient = step / V::from_day_count(span);
    Valuation::new(date, earlier.value + gradient * V::from_day_count(elapsed))
}

/// Binary search for the adjacent pair straddling `date`:
/// `snapshot[lower].day <= date < snapshot[lower + 1].day`.
///
/// `None` when the snapshot holds fewer than two records or `date` falls
/// outside `[first.day, last.day)`. Those are caller-misuse shapes; the
/// search refuses them rather than index past the ends.
pub fn bracket<V: SeriesValue>(snapshot: &[Valuation<V>], date: Date) -> Option<(usize, usize)> {
    let first = snapshot.first()?;
    let last = snapshot.last()?;
    if snapshot.len() < 2 || date < first.day || date >= last.day {
        return None;
    }

    let mut lower = 0;
    let mut upper = snapshot.len() - 1;
    while upper - lower > 1 {
        let middle = lower + (upper - lower) / 2;
        if snapshot[middle].day <= date {
            lower = middle;
        } else {
            upper = middle;
        }
    }

    Some((lower, upper))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::*;

    fn snapshot() -> Vec<Valuation<Decimal>> {
        vec![
            Valuation::new(date!(2024 - 01 - 01), dec!(10)),
            Valuation::new(date!(2024 - 02 - 01), dec!(20)),
            Valuation::new(date!(2024 - 03 - 01), dec!(30)),
            Valuation::new(date!(2024 - 04 - 01), dec!(40)),
        ]
    }

    #[test]
    fn bracket_finds_the_straddling_pair() {
        let records = snapshot();

        assert_eq!(bracket(&records, date!(2024 - 01 - 15)), Some((0, 1)));
        assert_eq!(bracket(&records, date!(2024 - 02 - 01)), Some((1, 2)));
        assert_eq!(bracket(&records, date!(2024 - 03 - 31)), Some((2, 3)));
    }

    #[test]
    fn bracket_refuses_out_of_range_dates() {
        let records = snapshot();

        assert_eq!(bracket(&records, date!(2023 - 12 - 31)), None);
        assert_eq!(bracket(&records, date!(2024 - 04 - 01)), None);
        assert_eq!(bracket(&records[..1], date!(2024 - 01 - 01)), None);
        assert_eq!(bracket::<Decimal>(&[], date!(2024 - 01 - 01)), None);
    }

    #[test]
    fn interpolation_walks_the_straight_line() {
        let earlier = Valuation::new(date!(2024 - 01 - 01), dec!(10));
        let later = Valuation::new(date!(2024 - 01 - 11), dec!(20));

        let result = interpolate_linear(&earlier, &later, date!(2024 - 01 - 06));
        assert_eq!(result, Valuation::new(date!(2024 - 01 - 06), dec!(15)));
    }

    #[test]
    fn degenerate_bracket_does_not_divide() {
        let earlier = Valuation::new(date!(2024 - 01 - 01), dec!(10));
        let later = Valuation::new(date!(2024 - 01 - 01), dec!(99));

        let result = interpolate_linear(&earlier, &later, date!(2024 - 01 - 01));
        assert_eq!(result.value, dec!(10));
    }

    #[test]
    fn overflowing_value_step_holds_the_earlier_value() {
        let earlier = Valuation::new(date!(2024 - 01 - 01), Decimal::MIN);
        let later = Valuation::new(date!(2024 - 01 - 11), Decimal::MAX);

        let result = interpolate_linear(&earlier, &later, date!(2024 - 01 - 06));
        assert_eq!(result, Valuation::new(date!(2024 - 01 - 06), Decimal::MIN));
    }

    #[test]
    fn empty_snapshot_yields_nothing_except_value_before() {
        let empty: Vec<Valuation<Decimal>> = Vec::new();
        let day = date!(2024 - 06 - 01);

        assert_eq!(value(&empty, day), None);
        assert_eq!(value_zero_before(&empty, day), None);
        assert_eq!(value_on_or_before(&empty, day), None);
        assert_eq!(value_after(&empty, day), None);
        assert_eq!(value_before(&empty, day), Valuation::zero(day));
    }

    #[test]
    fn single_record_extends_flat_in_both_directions() {
        let only = Valuation::new(date!(2024 - 02 - 01), dec!(7));
        let records = vec![only];

        assert_eq!(value(&records, date!(2023 - 01 - 01)), Some(only));
        assert_eq!(value(&records, date!(2024 - 02 - 01)), Some(only));
        assert_eq!(value(&records, date!(2025 - 01 - 01)), Some(only));
    }
}
