use crate::traits::portfolio::Portfolio;
use std::fmt;
use std::sync::Arc;

/// A cash movement to apply to a portfolio's reserve position once its
/// master strategy is idle.
#[derive(Clone)]
pub struct CashUpdateMessage {
    portfolio: Arc<dyn Portfolio>,
    value: f64,
    currency: String,
}

impl CashUpdateMessage {
    pub fn new(portfolio: Arc<dyn Portfolio>, value: f64, currency: impl Into<String>) -> Self {
        Self {
            portfolio,
            value,
            currency: currency.into(),
        }
    }

    pub fn portfolio(&self) -> &Arc<dyn Portfolio> {
        &self.portfolio
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl fmt::Debug for CashUpdateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CashUpdateMessage")
            .field("portfolio", &self.portfolio.id())
            .field("value", &self.value)
            .field("currency", &self.currency)
            .finish()
    }
}
