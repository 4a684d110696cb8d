use crate::model::identity::InstrumentId;
use crate::model::instrument::{InstrumentInfo, RollType, SeriesField};
use crate::traits::market_data::MarketData;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

type Series = BTreeMap<NaiveDate, f64>;

/// Daily series and FX rates held in memory.
#[derive(Debug, Default)]
pub struct MemoryMarketData {
    instruments: RwLock<HashMap<InstrumentId, InstrumentInfo>>,
    series: RwLock<HashMap<(InstrumentId, SeriesField), Series>>,
    rates: RwLock<HashMap<(String, String), f64>>,
}

impl MemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instrument(&self, info: InstrumentInfo) {
        if let Ok(mut map) = self.instruments.write() {
            map.insert(info.id(), info);
        }
    }

    pub fn set_value(&self, id: InstrumentId, date: NaiveDateTime, field: SeriesField, value: f64) {
        if let Ok(mut map) = self.series.write() {
            map.entry((id, field))
                .or_default()
                .insert(date.date(), value);
        }
    }

    pub fn set_last(&self, id: InstrumentId, date: NaiveDateTime, value: f64) {
        self.set_value(id, date, SeriesField::Last, value);
    }

    /// Registers `1 from = rate to`; the inverse is derived on lookup.
    pub fn set_rate(&self, from: &str, to: &str, rate: f64) {
        if let Ok(mut map) = self.rates.write() {
            map.insert((from.to_string(), to.to_string()), rate);
        }
    }
}

impl MarketData for MemoryMarketData {
    fn instrument(&self, id: InstrumentId) -> Option<InstrumentInfo> {
        self.instruments.read().ok()?.get(&id).cloned()
    }

    fn value(
        &self,
        id: InstrumentId,
        date: NaiveDateTime,
        field: SeriesField,
        roll: RollType,
    ) -> f64 {
        let Ok(map) = self.series.read() else {
            return f64::NAN;
        };
        let Some(series) = map.get(&(id, field)) else {
            return f64::NAN;
        };
        let day = date.date();
        let found = match roll {
            RollType::Exact => series.get(&day).copied(),
            RollType::Last => series.range(..=day).next_back().map(|(_, v)| *v),
        };
        found.unwrap_or(f64::NAN)
    }

    fn convert(&self, amount: f64, _date: NaiveDateTime, from: &str, to: &str) -> f64 {
        if from == to {
            return amount;
        }
        let Ok(map) = self.rates.read() else {
            return f64::NAN;
        };
        if let Some(rate) = map.get(&(from.to_string(), to.to_string())) {
            amount * rate
        } else if let Some(rate) = map.get(&(to.to_string(), from.to_string())) {
            amount / rate
        } else {
            f64::NAN
        }
    }
}
