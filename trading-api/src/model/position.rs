use super::identity::InstrumentId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A booked holding of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument: InstrumentId,
    pub unit: f64,
    pub strike: f64,
    pub date: NaiveDateTime,
}

impl Position {
    pub fn new(instrument: InstrumentId, unit: f64, strike: f64, date: NaiveDateTime) -> Self {
        Self {
            instrument,
            unit,
            strike,
            date,
        }
    }
}

/// Reserve currency leg: the instruments a portfolio uses to hold long and
/// short cash balances in `currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveLeg {
    pub currency: String,
    pub long: InstrumentId,
    pub short: InstrumentId,
}

impl ReserveLeg {
    pub fn new(currency: impl Into<String>, long: InstrumentId, short: InstrumentId) -> Self {
        Self {
            currency: currency.into(),
            long,
            short,
        }
    }
}
