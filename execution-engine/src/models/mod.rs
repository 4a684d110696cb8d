pub mod config;
pub mod counters;
pub mod instruction;

pub use config::*;
pub use counters::*;
pub use instruction::*;
