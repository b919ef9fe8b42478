//! Time-indexed valuation series.
//!
//! This crate contains:
//! - The dated-valuation record and the scalar contract it is generic over
//! - An ordered, date-unique store behind one coarse lock, with change
//!   observers and per-edit reporting
//! - Boundary and interpolation queries over lock-free snapshots
//! - Sum and compound-annual-rate aggregates
//! - The pinned wire format and its legacy read shapes

pub mod domain;
pub mod error;
pub mod query;
pub mod rates;
pub mod reporting;
pub mod series;
pub mod wire;

pub use domain::{SeriesValue, Valuation};
pub use error::{SeriesError, WireError};
pub use rates::RateConvention;
pub use reporting::{EditEvent, EditReporter, NoopEditReporter};
pub use series::{TimeSeries, ValuationSeries};
