pub mod calendar;
pub mod clock;
pub mod market_data;
pub mod portfolio;
pub mod strategy;
