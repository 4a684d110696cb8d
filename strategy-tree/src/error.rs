use execution_engine::RouterError;
use thiserror::Error;
use trading::StrategyId;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Attaching strategy {child} under {parent} would create a cycle")]
    Cycle { parent: StrategyId, child: StrategyId },

    #[error("Strategy {0} is not registered with the scheduler")]
    UnknownStrategy(StrategyId),

    #[error("Strategy {child} is not a child of {parent}")]
    NotAChild { parent: StrategyId, child: StrategyId },

    #[error("Strategy {0} is executing, try again later")]
    Busy(StrategyId),

    #[error("Strategy {0} has no portfolio and cannot be cloned")]
    NotCloneable(StrategyId),

    #[error("Strategy {0} has no portfolio")]
    NoPortfolio(StrategyId),

    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TreeError>;
