use thiserror::Error;
use trading::{PortfolioId, StrategyId};

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Strategy {0} has no portfolio to route orders for")]
    NoPortfolio(StrategyId),

    #[error("Portfolio {0} is not monitored by this router")]
    UnknownPortfolio(PortfolioId),

    #[error("Invalid router configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RouterError>;
