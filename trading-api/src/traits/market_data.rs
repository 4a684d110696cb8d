use crate::model::identity::InstrumentId;
use crate::model::instrument::{InstrumentInfo, RollType, SeriesField};
use chrono::NaiveDateTime;

/// Read access to reference data, prices and FX.
///
/// Missing values are reported as `f64::NAN`; callers must check before
/// using a value in arithmetic.
pub trait MarketData: Send + Sync {
    fn instrument(&self, id: InstrumentId) -> Option<InstrumentInfo>;

    /// Time-series lookup by date, field and roll convention.
    ///
    /// # Arguments
    ///
    /// * `id` - The instrument.
    /// * `date` - The reference date; only the calendar day is significant.
    /// * `field` - Which series to read.
    /// * `roll` - Whether to fall back to an earlier stamp.
    ///
    /// # Returns
    ///
    /// * `f64` - The value, or NaN when nothing matches.
    fn value(&self, id: InstrumentId, date: NaiveDateTime, field: SeriesField, roll: RollType)
    -> f64;

    /// Converts `amount` from one currency to another at `date`.
    fn convert(&self, amount: f64, date: NaiveDateTime, from: &str, to: &str) -> f64;
}
