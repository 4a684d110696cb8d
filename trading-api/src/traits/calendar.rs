use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSearch {
    Previous,
    Next,
}

/// Business-day arithmetic for a market or a portfolio.
pub trait Calendar: Send + Sync {
    /// Returns `date` if it falls on a business day, `None` otherwise.
    fn business_day(&self, date: NaiveDateTime) -> Option<NaiveDateTime>;

    /// The business day closest to `date` in the given direction, `date`
    /// itself when it already is one.
    fn closest_business_day(&self, date: NaiveDateTime, search: DateSearch) -> NaiveDateTime;

    /// Moves `n` business days from `date` (negative `n` goes back). The
    /// time of day is preserved.
    fn add_business_days(&self, date: NaiveDateTime, n: i64) -> NaiveDateTime;
}
