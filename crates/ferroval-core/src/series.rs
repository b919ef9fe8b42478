//! The valuation store: an ordered, date-unique sequence behind one lock.

use std::fmt::{self, Debug, Formatter};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::Date;

use crate::domain::{SeriesValue, Valuation};
use crate::error::{SeriesError, WireError};
use crate::query;
use crate::rates::{self, RateConvention};
use crate::reporting::{EditEvent, EditReporter};
use crate::wire;

type ChangeObserver<V> = dyn Fn(&TimeSeries<V>) + Send + Sync;

/// Ordered collection of dated valuations with one coarse lock per instance.
///
/// Mutators hold the lock for their full duration; reads hold it just long
/// enough to copy out a snapshot, and every query then runs against that
/// copy. Results can therefore be stale relative to a concurrent writer but
/// are always internally consistent.
///
/// Two invariants hold through [`TimeSeries::set_value`]: the sequence is
/// non-decreasing by day, and each day appears at most once. The legacy
/// [`TimeSeries::add_valuation`] path and bulk construction can both break
/// uniqueness; the queries tolerate the duplicates they produce.
///
/// Change observers registered with [`TimeSeries::on_change`] run
/// synchronously on the mutating thread, in registration order, after the
/// lock is released. An observer may query the series or register further
/// observers without deadlocking; an observer panic propagates to the
/// mutator.
pub struct TimeSeries<V: SeriesValue> {
    values: Mutex<Vec<Valuation<V>>>,
    observers: Mutex<Vec<Arc<ChangeObserver<V>>>>,
}

/// Decimal-valued series, the usual instantiation.
pub type ValuationSeries = TimeSeries<Decimal>;

impl<V: SeriesValue> TimeSeries<V> {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Builds over a caller-supplied sequence, stored exactly as given.
    /// The bulk path neither sorts nor de-duplicates; fixture builders rely
    /// on that to stage out-of-order and duplicate-day data.
    pub fn from_values(values: Vec<Valuation<V>>) -> Self {
        Self {
            values: Mutex::new(values),
            observers: Mutex::new(Vec::new()),
        }
    }

    fn lock_values(&self) -> MutexGuard<'_, Vec<Valuation<V>>> {
        self.values.lock().expect("series lock should not be poisoned")
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<Arc<ChangeObserver<V>>>> {
        self.observers
            .lock()
            .expect("observer list lock should not be poisoned")
    }

    pub fn is_empty(&self) -> bool {
        self.lock_values().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock_values().len()
    }

    /// Position of the first record on `day`, by linear scan.
    pub fn index_of(&self, day: Date) -> Option<usize> {
        self.lock_values().iter().position(|record| record.day == day)
    }

    /// Value of the first record on `day`, if any.
    pub fn try_get(&self, day: Date) -> Option<V> {
        self.lock_values()
            .iter()
            .find(|record| record.day == day)
            .map(|record| record.value)
    }

    /// Independent copy of the current sequence. Queries run against this,
    /// never against the live storage.
    pub fn values(&self) -> Vec<Valuation<V>> {
        self.lock_values().clone()
    }

    pub fn first(&self) -> Option<Valuation<V>> {
        self.lock_values().first().copied()
    }

    pub fn last(&self) -> Option<Valuation<V>> {
        self.lock_values().last().copied()
    }

    pub fn first_day(&self) -> Option<Date> {
        self.first().map(|record| record.day)
    }

    pub fn first_value(&self) -> Option<V> {
        self.first().map(|record| record.value)
    }

    pub fn last_day(&self) -> Option<Date> {
        self.last().map(|record| record.day)
    }

    pub fn last_value(&self) -> Option<V> {
        self.last().map(|record| record.value)
    }

    /// Records with `start <= day <= end`, in stored order.
    pub fn values_between(&self, start: Date, end: Date) -> Vec<Valuation<V>> {
        self.lock_values()
            .iter()
            .filter(|record| record.day >= start && record.day <= end)
            .copied()
            .collect()
    }

    /// Registers a change observer. Observers fire once per effective
    /// mutation, never for no-ops.
    pub fn on_change<F>(&self, observer: F)
    where
        F: Fn(&TimeSeries<V>) + Send + Sync + 'static,
    {
        self.lock_observers().push(Arc::new(observer));
    }

    /// Sets the value for `day`, overwriting in place when the day exists
    /// and inserting otherwise. Inserting re-sorts the sequence, which also
    /// repairs any disorder left by [`TimeSeries::try_edit`]. Repeating an
    /// unchanged `(day, value)` pair mutates nothing, reports nothing, and
    /// notifies nobody.
    pub fn set_value(&self, day: Date, value: V, reporter: Option<&dyn EditReporter<V>>) {
        let event = {
            let mut values = self.lock_values();
            match values.iter().position(|record| record.day == day) {
                Some(index) if values[index].value == value => None,
                Some(index) => {
                    let previous = values[index].value;
                    values[index].value = value;
                    Some(EditEvent::Changed {
                        day,
                        previous,
                        value,
                    })
                }
                None => {
                    values.push(Valuation::new(day, value));
                    values.sort_by(Valuation::cmp_by_day);
                    Some(EditEvent::Added { day, value })
                }
            }
        };

        if let Some(event) = event {
            self.dispatch(reporter, &[event]);
        }
    }

    /// Rewrites every record on `old_day` to `(new_day, value)` and reports
    /// whether anything matched. Duplicate days from the legacy append path
    /// are all rewritten.
    ///
    /// The sequence is not re-sorted afterwards: moving a record past its
    /// neighbors leaves the series out of day order until the next insert,
    /// and interpolating queries over a disordered series are unreliable.
    /// Long-standing callers depend on the records keeping their positions,
    /// so this stays as it is.
    pub fn try_edit(
        &self,
        old_day: Date,
        new_day: Date,
        value: V,
        reporter: Option<&dyn EditReporter<V>>,
    ) -> bool {
        let events = {
            let mut values = self.lock_values();
            let mut events = Vec::new();
            for record in values.iter_mut().filter(|record| record.day == old_day) {
                record.day = new_day;
                record.value = value;
                events.push(EditEvent::Rekeyed {
                    from: old_day,
                    to: new_day,
                    value,
                });
            }
            events
        };

        let edited = !events.is_empty();
        self.dispatch(reporter, &events);
        edited
    }

    /// Removes every record on `day` and reports whether any existed.
    pub fn try_delete(&self, day: Date, reporter: Option<&dyn EditReporter<V>>) -> bool {
        let removed = {
            let mut values = self.lock_values();
            let before = values.len();
            values.retain(|record| record.day != day);
            before - values.len()
        };

        if removed == 0 {
            return false;
        }
        self.dispatch(reporter, &[EditEvent::Removed { day }]);
        true
    }

    /// Collapses consecutive runs of equal values, keeping the first record
    /// of each run. Equal values separated by a different one are untouched.
    pub fn clean_values(&self) {
        let removed = {
            let mut values = self.lock_values();
            let before = values.len();
            values.dedup_by(|later, earlier| later.value == earlier.value);
            before - values.len()
        };

        if removed > 0 {
            self.notify_changed();
        }
    }

    /// Removes every record whose value equals `target`, adjacent or not.
    /// A different operation from [`TimeSeries::clean_values`], not a
    /// variant of it.
    pub fn purge_value(&self, target: V) {
        let removed = {
            let mut values = self.lock_values();
            let before = values.len();
            values.retain(|record| record.value != target);
            before - values.len()
        };

        if removed > 0 {
            self.notify_changed();
        }
    }

    /// Appends without checking day uniqueness, then re-sorts. Kept for old
    /// load paths; duplicate days it produces stay until a delete or edit
    /// touches them. New code should use [`TimeSeries::set_value`].
    pub fn add_valuation(&self, day: Date, value: V, reporter: Option<&dyn EditReporter<V>>) {
        {
            let mut values = self.lock_values();
            values.push(Valuation::new(day, value));
            values.sort_by(Valuation::cmp_by_day);
        }
        self.dispatch(reporter, &[EditEvent::Added { day, value }]);
    }

    /// New series with each value replaced by its capped reciprocal; days
    /// and ordering carry over. Zero values become the scalar's maximum
    /// rather than an infinity.
    pub fn inverted(&self) -> TimeSeries<V> {
        let inverted = self
            .values()
            .into_iter()
            .map(|record| Valuation::new(record.day, record.value.reciprocal()))
            .collect();
        Self::from_values(inverted)
    }

    /// Interpolating lookup with flat extension outside the recorded range.
    /// See [`query::value`].
    pub fn value(&self, date: Date) -> Option<Valuation<V>> {
        query::value(&self.values(), date)
    }

    /// Interpolating lookup with caller-supplied boundary and interpolation
    /// policies. See [`query::value_with`].
    pub fn value_with<P, Q, I>(
        &self,
        date: Date,
        prior: P,
        post: Q,
        interpolate: I,
    ) -> Option<Valuation<V>>
    where
        P: FnOnce(&Valuation<V>, Date) -> Valuation<V>,
        Q: FnOnce(&Valuation<V>, Date) -> Valuation<V>,
        I: FnOnce(&Valuation<V>, &Valuation<V>, Date) -> Valuation<V>,
    {
        query::value_with(&self.values(), date, prior, post, interpolate)
    }

    /// Interpolating lookup that reports a zero holding before the first
    /// record. See [`query::value_zero_before`].
    pub fn value_zero_before(&self, date: Date) -> Option<Valuation<V>> {
        query::value_zero_before(&self.values(), date)
    }

    /// Latest record on or before `date`. See [`query::value_on_or_before`].
    pub fn value_on_or_before(&self, date: Date) -> Option<Valuation<V>> {
        query::value_on_or_before(&self.values(), date)
    }

    /// Latest record strictly before `date`, zero-record fallback included.
    /// See [`query::value_before`].
    pub fn value_before(&self, date: Date) -> Valuation<V> {
        query::value_before(&self.values(), date)
    }

    /// Earliest record strictly after `date`. See [`query::value_after`].
    pub fn value_after(&self, date: Date) -> Option<Valuation<V>> {
        query::value_after(&self.values(), date)
    }

    /// Arithmetic sum of all values; zero when empty.
    pub fn sum(&self) -> V {
        rates::total(&self.values())
    }

    /// Compound annual growth rate between the realized values on or before
    /// each date, under the default 365-day convention.
    pub fn car(&self, earlier: Date, later: Date) -> f64 {
        self.car_with(earlier, later, RateConvention::default())
    }

    /// [`TimeSeries::car`] under a caller-chosen day-count convention.
    ///
    /// Boundaries resolve through the on-or-before lookup, never through
    /// interpolation: the rate is computed from valuations that actually
    /// happened. NaN when either boundary has no record to resolve to.
    pub fn car_with(&self, earlier: Date, later: Date, convention: RateConvention) -> f64 {
        let snapshot = self.values();
        let Some(start) = query::value_on_or_before(&snapshot, earlier) else {
            return f64::NAN;
        };
        let Some(end) = query::value_on_or_before(&snapshot, later) else {
            return f64::NAN;
        };
        rates::compound_annual_rate(&start, &end, convention)
    }

    /// Current sequence in the pinned collection shape.
    pub fn to_wire(&self) -> String {
        wire::encode_series(&self.values())
    }

    /// Series decoded from any accepted wire shape, stored as read.
    pub fn from_wire(input: &str) -> Result<Self, WireError> {
        wire::decode_series(input).map(Self::from_values)
    }

    /// Writes the collection shape to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), SeriesError> {
        wire::write_series(writer, &self.values())
    }

    /// Reads a series from `reader`, accepting every wire shape.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, SeriesError> {
        wire::read_series(reader).map(Self::from_values)
    }

    fn dispatch(&self, reporter: Option<&dyn EditReporter<V>>, events: &[EditEvent<V>]) {
        if events.is_empty() {
            return;
        }
        if let Some(reporter) = reporter {
            for event in events {
                reporter.report(*event);
            }
        }
        self.notify_changed();
    }

    fn notify_changed(&self) {
        // Copy the list out so observers run with no lock held and may
        // re-enter the series freely.
        let observers = self.lock_observers().clone();
        for observer in observers {
            observer(self);
        }
    }
}

impl<V: SeriesValue> Default for TimeSeries<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SeriesValue> From<Vec<Valuation<V>>> for TimeSeries<V> {
    fn from(values: Vec<Valuation<V>>) -> Self {
        Self::from_values(values)
    }
}

impl<V: SeriesValue> FromIterator<Valuation<V>> for TimeSeries<V> {
    fn from_iter<I: IntoIterator<Item = Valuation<V>>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

impl<V: SeriesValue> Debug for TimeSeries<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSeries")
            .field("values", &self.values())
            .field("observers", &self.lock_observers().len())
            .finish()
    }
}

impl<V: SeriesValue + Serialize> Serialize for TimeSeries<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values().serialize(serializer)
    }
}

impl<'de, V: SeriesValue + Deserialize<'de>> Deserialize<'de> for TimeSeries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Valuation<V>>::deserialize(deserializer).map(Self::from_values)
    }
}
