//! Domain types for dated valuations.
//!
//! [`Valuation`] is the atomic record the series stores: one calendar day
//! paired with one scalar. [`SeriesValue`] is the scalar contract the whole
//! crate is generic over; implementations ship for [`rust_decimal::Decimal`]
//! (the money-accurate default) and `f64`.

mod record;
mod scalar;

pub use record::Valuation;
pub use scalar::SeriesValue;
