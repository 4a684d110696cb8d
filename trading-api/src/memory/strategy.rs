use super::next_id;
use crate::model::context::ExecutionContext;
use crate::model::gate::ExecutionGate;
use crate::model::identity::StrategyId;
use crate::model::instrument::FundingType;
use crate::traits::calendar::Calendar;
use crate::traits::portfolio::Portfolio;
use crate::traits::strategy::Strategy;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Logic run by a [`MemoryStrategy`] on every execution.
pub type StrategyLogic = Arc<dyn Fn(&MemoryStrategy, &ExecutionContext) -> Result<()> + Send + Sync>;

/// Valuation override; the default values a strategy through its portfolio.
pub type Valuation = Arc<dyn Fn(&MemoryStrategy, NaiveDateTime) -> f64 + Send + Sync>;

/// Shared, ordered log of the calls made on memory collaborators.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

/// Strategy with pluggable logic and a daily AUM series kept in memory.
pub struct MemoryStrategy {
    id: StrategyId,
    name: String,
    initial_date: NaiveDateTime,
    final_date: NaiveDateTime,
    funding: FundingType,
    portfolio: Option<Arc<dyn Portfolio>>,
    calendar: Arc<dyn Calendar>,
    gate: ExecutionGate,
    initialized: AtomicBool,
    simulating: AtomicBool,
    removed: AtomicBool,
    values: RwLock<BTreeMap<NaiveDate, f64>>,
    sod: RwLock<BTreeMap<NaiveDate, f64>>,
    logic: Option<StrategyLogic>,
    valuation: Option<Valuation>,
    journal: Option<Journal>,
    executions: AtomicUsize,
    valuations: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStrategy {
    pub fn new(id: StrategyId, name: impl Into<String>, calendar: Arc<dyn Calendar>) -> Self {
        Self {
            id,
            name: name.into(),
            initial_date: NaiveDateTime::MIN,
            final_date: NaiveDateTime::MAX,
            funding: FundingType::default(),
            portfolio: None,
            calendar,
            gate: ExecutionGate::new(),
            initialized: AtomicBool::new(false),
            simulating: AtomicBool::new(false),
            removed: AtomicBool::new(false),
            values: RwLock::new(BTreeMap::new()),
            sod: RwLock::new(BTreeMap::new()),
            logic: None,
            valuation: None,
            journal: None,
            executions: AtomicUsize::new(0),
            valuations: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn with_dates(mut self, initial_date: NaiveDateTime, final_date: NaiveDateTime) -> Self {
        self.initial_date = initial_date;
        self.final_date = final_date;
        self
    }

    pub fn with_funding(mut self, funding: FundingType) -> Self {
        self.funding = funding;
        self
    }

    pub fn with_portfolio(mut self, portfolio: Arc<dyn Portfolio>) -> Self {
        self.portfolio = Some(portfolio);
        self
    }

    pub fn with_logic(mut self, logic: StrategyLogic) -> Self {
        self.logic = Some(logic);
        self
    }

    pub fn with_valuation(mut self, valuation: Valuation) -> Self {
        self.valuation = Some(valuation);
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_simulating(self, simulating: bool) -> Self {
        self.simulating.store(simulating, Ordering::Relaxed);
        self
    }

    /// Records an AUM observation, e.g. to seed history before a run.
    pub fn set_value(&self, date: NaiveDateTime, value: f64) {
        if let Ok(mut values) = self.values.write() {
            values.insert(date.date(), value);
        }
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::Relaxed)
    }

    pub fn valuations(&self) -> usize {
        self.valuations.load(Ordering::Relaxed)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Relaxed)
    }

    fn record(&self, verb: &str) {
        if let Some(journal) = &self.journal {
            journal.record(format!("{}:{}", verb, self.id));
        }
    }

    fn last_value_on_or_before(&self, day: NaiveDate) -> f64 {
        self.values
            .read()
            .ok()
            .and_then(|v| v.range(..=day).next_back().map(|(_, x)| *x))
            .unwrap_or(f64::NAN)
    }
}

impl Strategy for MemoryStrategy {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn initial_date(&self) -> NaiveDateTime {
        self.initial_date
    }

    fn final_date(&self) -> NaiveDateTime {
        self.final_date
    }

    fn funding(&self) -> FundingType {
        self.funding
    }

    fn portfolio(&self) -> Option<Arc<dyn Portfolio>> {
        self.portfolio.clone()
    }

    fn calendar(&self) -> Arc<dyn Calendar> {
        self.calendar.clone()
    }

    fn gate(&self) -> &ExecutionGate {
        &self.gate
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn is_simulating(&self) -> bool {
        self.simulating.load(Ordering::Relaxed)
    }

    fn initialize(&self) -> Result<()> {
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn execute_logic(&self, context: &ExecutionContext, _force: bool) -> Result<()> {
        self.executions.fetch_add(1, Ordering::Relaxed);
        self.record("logic");
        match &self.logic {
            Some(logic) => logic(self, context),
            None => Ok(()),
        }
    }

    fn post_execute_logic(&self, _date: NaiveDateTime) -> Result<()> {
        self.record("post");
        Ok(())
    }

    fn nav_calculation(&self, date: NaiveDateTime) -> Result<f64> {
        self.valuations.fetch_add(1, Ordering::Relaxed);
        self.record("nav");
        let value = match (&self.valuation, &self.portfolio) {
            (Some(valuation), _) => valuation(self, date),
            (None, Some(portfolio)) => portfolio.value(date),
            (None, None) => self.last_value_on_or_before(date.date()),
        };
        if !value.is_nan() {
            self.set_value(date, value);
        }
        Ok(value)
    }

    fn aum(&self, date: NaiveDateTime) -> f64 {
        self.values
            .read()
            .ok()
            .and_then(|v| v.get(&date.date()).copied())
            .unwrap_or(f64::NAN)
    }

    fn sod_aum(&self, date: NaiveDateTime) -> f64 {
        let day = date.date();
        if let Some(value) = self.sod.read().ok().and_then(|s| s.get(&day).copied()) {
            return value;
        }
        self.values
            .read()
            .ok()
            .and_then(|v| v.range(..day).next_back().map(|(_, x)| *x))
            .unwrap_or(f64::NAN)
    }

    fn first_value(&self) -> f64 {
        self.values
            .read()
            .ok()
            .and_then(|v| v.values().next().copied())
            .unwrap_or(f64::NAN)
    }

    fn clear_memory(&self, date: NaiveDateTime) {
        let day = date.date();
        if let Ok(mut values) = self.values.write() {
            values.remove(&day);
        }
        if let Ok(mut sod) = self.sod.write() {
            sod.remove(&day);
        }
    }

    fn clear_next_aum_memory(&self, date: NaiveDateTime) {
        let day = date.date();
        if let Ok(mut values) = self.values.write() {
            values.retain(|d, _| *d <= day);
        }
    }

    fn startup(&self, date: NaiveDateTime, initial_value: f64) -> Result<()> {
        self.set_value(date, initial_value);
        if let Some(portfolio) = &self.portfolio {
            portfolio.update_reserve_position(date, initial_value, &portfolio.currency())?;
        }
        self.initialized.store(true, Ordering::Release);
        self.record("startup");
        Ok(())
    }

    fn update_aum_order(&self, date: NaiveDateTime, value: f64) -> Result<()> {
        if let Ok(mut sod) = self.sod.write() {
            sod.insert(date.date(), value);
        }
        Ok(())
    }

    fn add_remove_sub_strategies(&self, _date: NaiveDateTime) -> Result<()> {
        self.record("subs");
        Ok(())
    }

    fn save(&self) -> Result<()> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.record("save");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.removed.store(true, Ordering::Relaxed);
        self.record("remove");
        Ok(())
    }

    fn remove_from(&self, date: NaiveDateTime) -> Result<()> {
        let day = date.date();
        if let Ok(mut values) = self.values.write() {
            values.retain(|d, _| *d < day);
        }
        self.record("remove_from");
        Ok(())
    }

    fn duplicate(
        &self,
        portfolio: Option<Arc<dyn Portfolio>>,
        initial_date: NaiveDateTime,
        final_date: NaiveDateTime,
        _clones: &HashMap<StrategyId, Arc<dyn Strategy>>,
        simulated: bool,
    ) -> Result<Arc<dyn Strategy>> {
        let mut copy = MemoryStrategy::new(next_id(), self.name.clone(), self.calendar.clone())
            .with_dates(initial_date, final_date)
            .with_funding(self.funding)
            .with_simulating(simulated);
        copy.portfolio = portfolio;
        copy.logic = self.logic.clone();
        copy.valuation = self.valuation.clone();
        copy.journal = self.journal.clone();
        // Index-style strategies carry their series into the new universe.
        if copy.portfolio.is_none() {
            if let (Ok(mut dst), Ok(src)) = (copy.values.write(), self.values.read()) {
                *dst = src.clone();
            }
        }
        Ok(Arc::new(copy))
    }
}
