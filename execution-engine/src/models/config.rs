use super::instruction::Instruction;
use crate::error::{Result, RouterError};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_price_floor() -> f64 {
    0.001
}

fn default_volume_window() -> usize {
    10
}

/// Point size applied to every instrument whose name starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSizeOverride {
    pub prefix: String,
    pub point_size: f64,
}

/// A broker client known at start-up. Callbacks are attached at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSpec {
    pub name: String,
    #[serde(default)]
    pub destinations: Vec<String>,
}

/// Configuration of a [`crate::MarketRouter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Period of the background cash/booking tick.
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,
    /// Lowest price a simulated fill may be booked at after fees.
    #[serde(default = "default_price_floor")]
    price_floor: f64,
    /// Business days in the trailing volume average of the impact model.
    #[serde(default = "default_volume_window")]
    volume_window: usize,
    #[serde(default)]
    point_sizes: Vec<PointSizeOverride>,
    #[serde(default)]
    instructions: Vec<Instruction>,
    #[serde(default)]
    clients: Vec<ClientSpec>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            price_floor: default_price_floor(),
            volume_window: default_volume_window(),
            point_sizes: Vec::new(),
            instructions: Vec::new(),
            clients: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Loads the `router` section of a settings file, overlaid by
    /// `APP__ROUTER__*` environment variables. A missing file or section
    /// yields the defaults.
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
        let config = match settings.get::<RouterConfig>("router") {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => RouterConfig::default(),
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(RouterError::InvalidConfig(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if !(self.price_floor > 0.0) {
            return Err(RouterError::InvalidConfig(format!(
                "price_floor must be positive, got {}",
                self.price_floor
            )));
        }
        if let Some(bad) = self.point_sizes.iter().find(|o| !(o.point_size > 0.0)) {
            return Err(RouterError::InvalidConfig(format!(
                "point size for prefix '{}' must be positive",
                bad.prefix
            )));
        }
        Ok(())
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    pub fn with_point_size(mut self, prefix: impl Into<String>, point_size: f64) -> Self {
        self.point_sizes.push(PointSizeOverride {
            prefix: prefix.into(),
            point_size,
        });
        self
    }

    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn price_floor(&self) -> f64 {
        self.price_floor
    }

    pub fn volume_window(&self) -> usize {
        self.volume_window.max(1)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn clients(&self) -> &[ClientSpec] {
        &self.clients
    }

    /// The configured point size for `name`, if any prefix matches.
    pub fn point_size_override(&self, name: &str) -> Option<f64> {
        self.point_sizes
            .iter()
            .find(|o| name.starts_with(&o.prefix))
            .map(|o| o.point_size)
    }
}
