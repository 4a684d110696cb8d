//! Execution fees and the market-impact surcharge of simulated fills.

use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};
use trading::{Calendar, DateSearch, InstrumentId, InstrumentInfo, MarketData, RollType, SeriesField};

/// Configured (fee, min fee, max fee) triple.
///
/// A negative value is a rate rather than an amount: the per-unit fee is
/// multiplied by price, the bounds by price and absolute units. A max fee
/// of exactly zero means "no cap".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub fee: f64,
    pub min_fee: f64,
    pub max_fee: f64,
}

impl FeeSchedule {
    pub fn new(fee: f64, min_fee: f64, max_fee: f64) -> Self {
        Self {
            fee,
            min_fee,
            max_fee,
        }
    }

    /// Per-unit fee charged for trading `unit` at `price`, clamped into
    /// `[min_fee / |unit|, max_fee / |unit|]`.
    pub fn per_unit(&self, price: f64, unit: f64) -> f64 {
        let units = unit.abs();
        let fee = if self.fee < 0.0 {
            -self.fee * price
        } else {
            self.fee
        };
        if units == 0.0 {
            return fee;
        }
        let min_fee = if self.min_fee < 0.0 {
            -self.min_fee * price * units
        } else {
            self.min_fee
        };
        let max_fee = if self.max_fee < 0.0 {
            -self.max_fee * price * units
        } else {
            self.max_fee
        };

        if units * fee < min_fee {
            min_fee / units
        } else if max_fee != 0.0 && units * fee > max_fee {
            max_fee / units
        } else {
            fee
        }
    }
}

/// Pluggable cost model: `(date, instrument) -> impact factor`.
pub trait ImpactModel: Send + Sync {
    fn factor(&self, date: NaiveDateTime, instrument: InstrumentId) -> f64;
}

impl<F> ImpactModel for F
where
    F: Fn(NaiveDateTime, InstrumentId) -> f64 + Send + Sync,
{
    fn factor(&self, date: NaiveDateTime, instrument: InstrumentId) -> f64 {
        self(date, instrument)
    }
}

/// Inputs shared by every impact estimate of one fill.
pub struct ImpactInputs<'a> {
    pub market: &'a dyn MarketData,
    pub calendar: &'a dyn Calendar,
    pub instrument: &'a InstrumentInfo,
    pub point_size: f64,
    pub portfolio_currency: &'a str,
    pub window: usize,
}

impl ImpactInputs<'_> {
    /// Average daily traded value over the trailing window, in portfolio
    /// currency. Missing prices or volumes count as zero.
    pub fn average_daily_value(&self, anchor: NaiveDateTime) -> f64 {
        let id = self.instrument.id();
        let window = self.window.max(1);
        let mut total = 0.0;
        for i in 0..window {
            let day = self.calendar.add_business_days(anchor, -(i as i64));
            let fx = self
                .market
                .convert(1.0, day, self.portfolio_currency, self.instrument.currency());
            let price = self.market.value(id, day, SeriesField::Last, RollType::Last)
                * self.point_size
                * fx;
            let volume = self.market.value(id, day, SeriesField::Volume, RollType::Last);
            let price = if price.is_nan() { 0.0 } else { price };
            let volume = if volume.is_nan() { 0.0 } else { volume };
            total += price * volume;
        }
        total / window as f64
    }

    /// Price surcharge for trading `unit` at `level`:
    /// `level * (trade notional / average daily value) * factor`.
    pub fn impact(&self, date: NaiveDateTime, unit: f64, level: f64, factor: f64) -> f64 {
        let id = self.instrument.id();
        let anchor = self.calendar.closest_business_day(date, DateSearch::Previous);
        let adv = self.average_daily_value(anchor);
        if !(adv > 0.0) {
            warn!(
                "No traded volume for instrument {} before {}, market impact skipped",
                id, anchor
            );
            return 0.0;
        }
        let fx = self
            .market
            .convert(1.0, anchor, self.portfolio_currency, self.instrument.currency());
        let notional = unit.abs()
            * self.market.value(id, anchor, SeriesField::Last, RollType::Last)
            * self.point_size
            * fx;
        let impact = level * (notional / adv) * factor;
        if impact.is_finite() {
            impact
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests;
