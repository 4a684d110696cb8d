use crate::error::Result;
use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_tick_offset_ms() -> i64 {
    3
}

/// Configuration of a [`crate::TreeScheduler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Gap between the logic stages of a tick and its valuation stages.
    #[serde(default = "default_tick_offset_ms")]
    tick_offset_ms: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_offset_ms: default_tick_offset_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Loads the `scheduler` section of a settings file, overlaid by
    /// `APP__SCHEDULER__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;
        Self::from_settings(&settings)
    }

    pub fn from_settings(settings: &Config) -> Result<Self> {
        match settings.get::<SchedulerConfig>("scheduler") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(SchedulerConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn with_tick_offset(mut self, offset: Duration) -> Self {
        self.tick_offset_ms = offset.num_milliseconds().max(0);
        self
    }

    pub fn tick_offset(&self) -> Duration {
        Duration::milliseconds(self.tick_offset_ms.max(0))
    }
}
