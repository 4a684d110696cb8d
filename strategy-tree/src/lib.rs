//! Scheduling of strategy hierarchies.
//!
//! A [`TreeScheduler`] drives the daily tick of every strategy tree it
//! knows: logic bottom-up, order submission and fills through the shared
//! [`execution_engine::MarketRouter`], then booking, valuation and
//! persistence.

mod cache;
pub mod config;
pub mod error;
mod node;
mod scheduler;

pub use cache::NavCache;
pub use config::SchedulerConfig;
pub use error::{Result, TreeError};
pub use node::TreeNode;
pub use scheduler::TreeScheduler;
