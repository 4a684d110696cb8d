//! Layered routing and fee configuration.
//!
//! Lookups walk a fixed cascade from the most specific key to the global
//! default:
//!
//! 1. (portfolio, instrument)
//! 2. (portfolio, underlying) for derivatives
//! 3. (portfolio, 0)
//! 4. (0, instrument)
//! 5. (0, underlying) for derivatives
//! 6. (0, 0)
//!
//! and fall back to [`Instruction::inherit`] when nothing matches.

use crate::models::Instruction;
use dashmap::DashMap;
use trading::{InstrumentId, PortfolioId, WILDCARD};

#[derive(Debug, Default)]
pub struct InstructionTable {
    entries: DashMap<(PortfolioId, InstrumentId), Instruction>,
}

impl InstructionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instructions<'a>(instructions: impl IntoIterator<Item = &'a Instruction>) -> Self {
        let table = Self::new();
        for instruction in instructions {
            table.upsert(instruction.clone());
        }
        table
    }

    /// Inserts or replaces the instruction stored under its own key.
    pub fn upsert(&self, instruction: Instruction) {
        self.entries.insert(instruction.key(), instruction);
    }

    pub fn remove(&self, portfolio: PortfolioId, instrument: InstrumentId) -> Option<Instruction> {
        self.entries
            .remove(&(portfolio, instrument))
            .map(|(_, instruction)| instruction)
    }

    /// Exact-key lookup, no cascade.
    pub fn get(&self, portfolio: PortfolioId, instrument: InstrumentId) -> Option<Instruction> {
        self.entries
            .get(&(portfolio, instrument))
            .map(|entry| entry.value().clone())
    }

    /// All instructions ordered by key.
    pub fn all(&self) -> Vec<Instruction> {
        let mut all: Vec<Instruction> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(Instruction::key);
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cascade(
        portfolio: PortfolioId,
        instrument: InstrumentId,
        underlying: Option<InstrumentId>,
    ) -> Vec<(PortfolioId, InstrumentId)> {
        let mut keys = Vec::with_capacity(6);
        for level in [portfolio, WILDCARD] {
            keys.push((level, instrument));
            if let Some(underlying) = underlying {
                keys.push((level, underlying));
            }
            keys.push((level, WILDCARD));
        }
        keys.dedup();
        keys
    }

    fn matches(
        &self,
        portfolio: PortfolioId,
        instrument: InstrumentId,
        underlying: Option<InstrumentId>,
    ) -> impl Iterator<Item = Instruction> + '_ {
        Self::cascade(portfolio, instrument, underlying)
            .into_iter()
            .filter_map(move |(p, i)| self.get(p, i))
    }

    /// The most specific instruction for the pair, whatever its client.
    /// Fees are always read from this level.
    pub fn resolve(
        &self,
        portfolio: PortfolioId,
        instrument: InstrumentId,
        underlying: Option<InstrumentId>,
    ) -> Instruction {
        self.matches(portfolio, instrument, underlying)
            .next()
            .unwrap_or_else(Instruction::inherit)
    }

    /// The most specific instruction naming a real client. Levels whose
    /// client is "Inherit" defer their routing and lot sizes to the next
    /// broader level.
    pub fn resolve_route(
        &self,
        portfolio: PortfolioId,
        instrument: InstrumentId,
        underlying: Option<InstrumentId>,
    ) -> Instruction {
        self.matches(portfolio, instrument, underlying)
            .find(|instruction| !instruction.is_inherit())
            .unwrap_or_else(Instruction::inherit)
    }
}
