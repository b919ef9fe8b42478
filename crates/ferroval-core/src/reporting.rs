//! Edit reporting for series mutations.
//!
//! Mutators accept an optional [`EditReporter`] and hand it one
//! [`EditEvent`] per record they touched. Reports are delivered on the
//! mutating thread after the series lock is released, so an implementation
//! may query the series again without deadlocking.

use std::fmt::{Display, Formatter};

use time::Date;

use crate::domain::SeriesValue;

/// A single store edit, reported to the per-call sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditEvent<V> {
    /// A record was inserted on a previously absent day.
    Added { day: Date, value: V },
    /// An existing day's value was overwritten with a different one.
    Changed { day: Date, previous: V, value: V },
    /// A record was moved to another day and revalued.
    Rekeyed { from: Date, to: Date, value: V },
    /// Every record on the day was deleted.
    Removed { day: Date },
}

impl<V: SeriesValue> Display for EditEvent<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added { day, value } => write!(f, "added {value} on {day}"),
            Self::Changed {
                day,
                previous,
                value,
            } => write!(f, "changed {day} from {previous} to {value}"),
            Self::Rekeyed { from, to, value } => {
                write!(f, "moved {from} to {to} with value {value}")
            }
            Self::Removed { day } => write!(f, "removed {day}"),
        }
    }
}

/// Sink for edit reports.
pub trait EditReporter<V: SeriesValue>: Send + Sync {
    fn report(&self, event: EditEvent<V>);
}

/// Reporter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEditReporter;

impl<V: SeriesValue> EditReporter<V> for NoopEditReporter {
    fn report(&self, _event: EditEvent<V>) {}
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::*;

    #[test]
    fn events_render_one_line_each() {
        let added = EditEvent::Added {
            day: date!(2024 - 01 - 02),
            value: dec!(5),
        };
        let changed = EditEvent::Changed {
            day: date!(2024 - 01 - 02),
            previous: dec!(5),
            value: dec!(7),
        };
        let rekeyed = EditEvent::Rekeyed {
            from: date!(2024 - 01 - 02),
            to: date!(2024 - 02 - 02),
            value: dec!(7),
        };
        let removed = EditEvent::<rust_decimal::Decimal>::Removed {
            day: date!(2024 - 02 - 02),
        };

        assert_eq!(added.to_string(), "added 5 on 2024-01-02");
        assert_eq!(changed.to_string(), "changed 2024-01-02 from 5 to 7");
        assert_eq!(
            rekeyed.to_string(),
            "moved 2024-01-02 to 2024-02-02 with value 7"
        );
        assert_eq!(removed.to_string(), "removed 2024-02-02");
    }
}
