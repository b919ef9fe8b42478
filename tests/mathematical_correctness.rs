//! Behavior-driven tests for query and rate mathematics
//!
//! These tests pin the numeric behavior down to the digit: straight-line
//! interpolation in decimal arithmetic, the boundary policies on each side
//! of the recorded range, and compound-annual-rate selection of realized
//! valuations.

use ferroval_tests::{query, series_of, Decimal, RateConvention, Valuation, ValuationSeries};
use rust_decimal_macros::dec;
use time::macros::date;

fn growth_fixture() -> ValuationSeries {
    series_of(&[
        (date!(2018 - 01 - 01), dec!(0)),
        (date!(2019 - 01 - 01), dec!(1)),
        (date!(2019 - 05 - 01), dec!(2)),
        (date!(2019 - 05 - 05), dec!(0)),
    ])
}

fn car_fixture() -> ValuationSeries {
    series_of(&[
        (date!(2017 - 01 - 01), dec!(1000)),
        (date!(2018 - 01 - 01), dec!(1100)),
        (date!(2018 - 06 - 01), dec!(1200)),
    ])
}

// =============================================================================
// Interpolation
// =============================================================================

#[test]
fn interpolated_value_carries_the_decimal_division_residue() {
    // Given: the query date sits 63 days into the 120-day bracket between
    // (2019-01-01, 1) and (2019-05-01, 2)
    let series = growth_fixture();

    // When: the canonical interpolating lookup runs
    let result = series.value(date!(2019 - 03 - 05)).expect("in range");

    // Then: dividing the value step by the day span before scaling leaves
    // the repeating-third residue in the last place
    assert_eq!(result.day, date!(2019 - 03 - 05));
    assert_eq!(result.value, dec!(1.5249999999999999999999999979));
}

#[test]
fn interpolation_is_exact_on_recorded_days() {
    let series = growth_fixture();

    let on_record = series.value(date!(2019 - 01 - 01)).expect("in range");
    assert_eq!(on_record.value, dec!(1));

    let mid_gap = series.value(date!(2019 - 05 - 03)).expect("in range");
    // Halfway down from 2 to 0 over four days
    assert_eq!(mid_gap.value, dec!(1));
}

#[test]
fn caller_supplied_policies_replace_the_defaults() {
    let series = growth_fixture();

    // Given: a step interpolator and a halving prior policy
    let step = |earlier: &Valuation<Decimal>, _later: &Valuation<Decimal>, date: time::Date| {
        Valuation::new(date, earlier.value)
    };
    let halved = |first: &Valuation<Decimal>, date: time::Date| {
        Valuation::new(date, first.value / dec!(2))
    };
    let flat = |last: &Valuation<Decimal>, _date: time::Date| *last;

    // When: the same search runs under those policies
    let inside = series
        .value_with(date!(2019 - 03 - 05), halved, flat, step)
        .expect("in range");
    let before = series
        .value_with(date!(2017 - 06 - 01), halved, flat, step)
        .expect("prior policy");

    // Then: the bracket search is unchanged while the shaping is the caller's
    assert_eq!(inside.value, dec!(1), "step policy holds the earlier value");
    assert_eq!(before.day, date!(2017 - 06 - 01));
    assert_eq!(before.value, dec!(0), "half of the first record's zero");
}

#[test]
fn bracket_search_lands_on_the_straddling_pair() {
    let series = growth_fixture();
    let snapshot = series.values();

    assert_eq!(query::bracket(&snapshot, date!(2019 - 03 - 05)), Some((1, 2)));
    assert_eq!(query::bracket(&snapshot, date!(2019 - 05 - 01)), Some((2, 3)));
    assert_eq!(query::bracket(&snapshot, date!(2017 - 01 - 01)), None);
    assert_eq!(query::bracket(&snapshot, date!(2019 - 05 - 05)), None);
}

// =============================================================================
// Boundary Policies
// =============================================================================

#[test]
fn flat_policy_extends_the_recorded_range_unchanged() {
    let series = growth_fixture();

    // Before the first record: the first record itself, its own day kept
    let before = series.value(date!(2017 - 06 - 01)).expect("flat prior");
    assert_eq!(before, Valuation::new(date!(2018 - 01 - 01), dec!(0)));

    // On and after the last record: the last record itself
    let on_last = series.value(date!(2019 - 05 - 05)).expect("flat post");
    let after = series.value(date!(2022 - 01 - 01)).expect("flat post");
    assert_eq!(on_last, Valuation::new(date!(2019 - 05 - 05), dec!(0)));
    assert_eq!(after, on_last);
}

#[test]
fn zero_before_policy_reports_no_holding_before_the_first_record() {
    let series = growth_fixture();

    // Before the range: a zero record dated at the query date
    let before = series
        .value_zero_before(date!(2017 - 06 - 01))
        .expect("zero prior");
    assert_eq!(before, Valuation::new(date!(2017 - 06 - 01), dec!(0)));

    // Inside the range: identical to the canonical lookup
    let inside = series
        .value_zero_before(date!(2019 - 03 - 05))
        .expect("in range");
    assert_eq!(inside.value, dec!(1.5249999999999999999999999979));
}

#[test]
fn on_or_before_steps_to_the_latest_realized_record() {
    let series = car_fixture();

    assert_eq!(series.value_on_or_before(date!(2016 - 12 - 31)), None);
    assert_eq!(
        series.value_on_or_before(date!(2017 - 01 - 01)),
        Some(Valuation::new(date!(2017 - 01 - 01), dec!(1000)))
    );
    assert_eq!(
        series.value_on_or_before(date!(2018 - 03 - 15)),
        Some(Valuation::new(date!(2018 - 01 - 01), dec!(1100)))
    );
    assert_eq!(
        series.value_on_or_before(date!(2025 - 01 - 01)),
        Some(Valuation::new(date!(2018 - 06 - 01), dec!(1200)))
    );
}

#[test]
fn strictly_before_returns_the_previous_record_at_an_exact_match() {
    let series = car_fixture();

    let before = series.value_before(date!(2018 - 01 - 01));
    assert_eq!(before, Valuation::new(date!(2017 - 01 - 01), dec!(1000)));

    // On the first day there is nothing strictly before: zero fallback
    let at_first = series.value_before(date!(2017 - 01 - 01));
    assert_eq!(at_first, Valuation::new(date!(2017 - 01 - 01), dec!(0)));
}

#[test]
fn strictly_after_stops_at_the_last_record() {
    let series = car_fixture();

    assert_eq!(
        series.value_after(date!(2016 - 01 - 01)),
        Some(Valuation::new(date!(2017 - 01 - 01), dec!(1000)))
    );
    assert_eq!(
        series.value_after(date!(2018 - 01 - 01)),
        Some(Valuation::new(date!(2018 - 06 - 01), dec!(1200)))
    );
    assert_eq!(series.value_after(date!(2018 - 06 - 01)), None);
}

// =============================================================================
// Compound Annual Rate
// =============================================================================

#[test]
fn car_resolves_boundaries_to_realized_valuations() {
    // Given: the later query date lies beyond the last record
    let series = car_fixture();

    // When: the rate is taken from 2017-01-01 out to 2019-01-01
    let rate = series.car(date!(2017 - 01 - 01), date!(2019 - 01 - 01));

    // Then: the later boundary resolved on-or-before to (2018-06-01, 1200),
    // 516 days after the earlier boundary, rather than failing or
    // interpolating
    let expected = 1.2_f64.powf(365.0 / 516.0) - 1.0;
    assert!((rate - expected).abs() < 1e-12, "rate was {rate}");
    assert!((rate - 0.1376).abs() < 1e-3, "rate was {rate}");
}

#[test]
fn car_is_nan_when_a_boundary_has_no_record() {
    let series = car_fixture();
    assert!(series
        .car(date!(2016 - 01 - 01), date!(2018 - 01 - 01))
        .is_nan());

    let empty = ValuationSeries::new();
    assert!(empty
        .car(date!(2017 - 01 - 01), date!(2018 - 01 - 01))
        .is_nan());
}

#[test]
fn car_is_nan_when_the_earlier_valuation_is_zero() {
    let series = series_of(&[
        (date!(2020 - 01 - 01), dec!(0)),
        (date!(2021 - 01 - 01), dec!(50)),
    ]);

    assert!(series
        .car(date!(2020 - 01 - 01), date!(2021 - 01 - 01))
        .is_nan());
}

#[test]
fn car_day_count_convention_is_configurable() {
    let series = car_fixture();
    let earlier = date!(2017 - 01 - 01);
    let later = date!(2019 - 01 - 01);

    let civil = series.car(earlier, later);
    let astronomical = series.car_with(
        earlier,
        later,
        RateConvention {
            days_per_year: 365.25,
        },
    );

    // A longer year exponent raises the annualized rate of a gain
    assert!(astronomical > civil);
    let expected = 1.2_f64.powf(365.25 / 516.0) - 1.0;
    assert!((astronomical - expected).abs() < 1e-12);
}

#[test]
fn car_across_an_inversion_sentinel_stays_finite() {
    // Given: inverting plants the zero cap next to a tiny reciprocal
    let series = series_of(&[
        (date!(2020 - 01 - 01), dec!(10000000000)),
        (date!(2021 - 01 - 01), dec!(0)),
    ]);
    let inverted = series.inverted();

    // When: the rate spans from the tiny reciprocal up to the cap
    let rate = inverted.car(date!(2020 - 01 - 01), date!(2021 - 01 - 01));

    // Then: the ratio widens to f64 instead of overflowing the decimal
    assert!(rate.is_finite());
    assert!(rate > 0.0, "rate was {rate}");
}

// =============================================================================
// Aggregates
// =============================================================================

#[test]
fn sum_adds_every_stored_value() {
    let series = car_fixture();
    assert_eq!(series.sum(), dec!(3300));

    let empty = ValuationSeries::new();
    assert_eq!(empty.sum(), Decimal::ZERO);
}

#[test]
fn inverted_series_mirrors_days_and_flips_values() {
    let series = series_of(&[
        (date!(2024 - 01 - 01), dec!(4)),
        (date!(2024 - 02 - 01), dec!(0.1)),
    ]);

    let inverted = series.inverted();
    assert_eq!(
        inverted.values(),
        vec![
            Valuation::new(date!(2024 - 01 - 01), dec!(0.25)),
            Valuation::new(date!(2024 - 02 - 01), dec!(10)),
        ]
    );
}
