use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Inputs handed to a strategy's logic for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub order_date: NaiveDateTime,
    /// Start-of-day AUM, floored at zero. A missing AUM counts as zero.
    pub reference_aum: f64,
}

impl ExecutionContext {
    pub fn new(order_date: NaiveDateTime, sod_aum: f64) -> Self {
        Self {
            order_date,
            reference_aum: if sod_aum.is_nan() { 0.0 } else { sod_aum.max(0.0) },
        }
    }
}
