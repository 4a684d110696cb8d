use serde::{Deserialize, Serialize};

/// Running execution totals of one master portfolio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    /// Fees paid, in portfolio currency.
    pub costs: f64,
    /// Traded value before fees.
    pub notional: f64,
    /// Absolute units traded.
    pub contracts: f64,
}

impl CostTotals {
    pub fn record(&mut self, fee_per_unit: f64, level: f64, unit: f64) {
        let units = unit.abs();
        self.costs += fee_per_unit * units;
        self.notional += level * units;
        self.contracts += units;
    }
}
