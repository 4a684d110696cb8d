use chrono::NaiveDateTime;
use dashmap::DashMap;
use trading::StrategyId;

/// Valuations computed during a pass, keyed by business date and node.
///
/// A key is written at most once; later writers get the first value back.
#[derive(Debug, Default)]
pub struct NavCache {
    values: DashMap<(NaiveDateTime, StrategyId), f64>,
}

impl NavCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDateTime, id: StrategyId) -> Option<f64> {
        self.values.get(&(date, id)).map(|v| *v)
    }

    /// Stores `value` unless the key is already cached and returns the
    /// cached value.
    pub fn insert_if_absent(&self, date: NaiveDateTime, id: StrategyId, value: f64) -> f64 {
        *self.values.entry((date, id)).or_insert(value)
    }

    /// Drops every entry of `id`, whatever its date.
    pub fn purge(&self, id: StrategyId) -> usize {
        let before = self.values.len();
        self.values.retain(|(_, key), _| *key != id);
        before - self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
