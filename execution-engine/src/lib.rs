//! Market router and fill engine.
//!
//! Turns the orders strategies leave in their ledgers into routed,
//! fee-adjusted and netted orders, fills them against market data during
//! simulations, books "Simulator" orders during live sessions and fans
//! status changes out to observers. One [`MarketRouter`] owns every
//! registry involved; nothing here is process-global.

pub mod broker;
pub mod error;
pub mod fees;
pub mod instructions;
pub mod models;
pub mod netting;
pub mod notify;
pub mod router;

pub use broker::recording::RecordingBroker;
pub use broker::{Broker, ClientConnection};
pub use error::{Result, RouterError};
pub use fees::{FeeSchedule, ImpactModel};
pub use instructions::InstructionTable;
pub use models::{CostTotals, Instruction, PointSizeOverride, RouterConfig};
pub use netting::Netting;
pub use notify::{Notifier, SubscriptionId, UpdateCallback};
pub use router::{MarketRouter, TreeHost};
