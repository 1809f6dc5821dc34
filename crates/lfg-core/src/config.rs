//! Simulator startup configuration.
//!
//! Parameters can come from command-line flags, an `lfg.toml` file, or
//! interactive prompts. Sources are layered with [`PartialConfig::merge`]
//! and anything still missing is filled in by [`PartialConfig::resolve_with`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::types::RoleQueue;

/// Fully resolved startup parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Maximum number of concurrent dungeon instances.
    pub instances: u32,
    pub tanks: u64,
    pub healers: u64,
    pub dps: u64,
    /// Shortest dungeon run, in seconds.
    pub min_time: u64,
    /// Longest dungeon run, in seconds.
    pub max_time: u64,
    /// Seed for run durations. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimConfig {
    /// Swap `min_time` and `max_time` if they are reversed.
    pub fn normalized(mut self) -> Self {
        if self.min_time > self.max_time {
            debug!(
                min_time = self.min_time,
                max_time = self.max_time,
                "run time bounds reversed, swapping"
            );
            std::mem::swap(&mut self.min_time, &mut self.max_time);
        }
        self
    }

    /// The initial queue described by this config.
    pub fn initial_queue(&self) -> RoleQueue {
        RoleQueue::new(self.tanks, self.healers, self.dps)
    }
}

/// A startup parameter, listed in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Instances,
    Tanks,
    Healers,
    Dps,
    MinTime,
    MaxTime,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Instances,
        Field::Tanks,
        Field::Healers,
        Field::Dps,
        Field::MinTime,
        Field::MaxTime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Instances => "instances",
            Field::Tanks => "tanks",
            Field::Healers => "healers",
            Field::Dps => "dps",
            Field::MinTime => "min_time",
            Field::MaxTime => "max_time",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Field::Instances => "Enter max number of concurrent instances (n): ",
            Field::Tanks => "Enter number of tanks in queue (t): ",
            Field::Healers => "Enter number of healers in queue (h): ",
            Field::Dps => "Enter number of DPS in queue (d): ",
            Field::MinTime => "Enter minimum dungeon time in seconds (t1): ",
            Field::MaxTime => "Enter maximum dungeon time in seconds (t2): ",
        }
    }

    /// Parse a non-negative integer typed for this field.
    pub fn parse(&self, input: &str) -> Result<u64, ConfigError> {
        let trimmed = input.trim();
        let value = trimmed
            .parse::<u64>()
            .map_err(|_| self.invalid(trimmed))?;
        if *self == Field::Instances && u32::try_from(value).is_err() {
            return Err(self.invalid(trimmed));
        }
        Ok(value)
    }

    fn invalid(&self, input: &str) -> ConfigError {
        ConfigError::InvalidNumber {
            field: self.name(),
            input: input.to_string(),
        }
    }
}

/// Startup parameters from a single source; any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub instances: Option<u32>,
    pub tanks: Option<u64>,
    pub healers: Option<u64>,
    pub dps: Option<u64>,
    pub min_time: Option<u64>,
    pub max_time: Option<u64>,
    pub seed: Option<u64>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Layer `self` over `lower`: fields set in `self` win.
    pub fn merge(self, lower: PartialConfig) -> Self {
        Self {
            instances: self.instances.or(lower.instances),
            tanks: self.tanks.or(lower.tanks),
            healers: self.healers.or(lower.healers),
            dps: self.dps.or(lower.dps),
            min_time: self.min_time.or(lower.min_time),
            max_time: self.max_time.or(lower.max_time),
            seed: self.seed.or(lower.seed),
        }
    }

    /// Fields that still need a value, in prompt order.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }

    fn get(&self, field: Field) -> Option<u64> {
        match field {
            Field::Instances => self.instances.map(u64::from),
            Field::Tanks => self.tanks,
            Field::Healers => self.healers,
            Field::Dps => self.dps,
            Field::MinTime => self.min_time,
            Field::MaxTime => self.max_time,
        }
    }

    /// Fill missing fields by calling `ask` for each, in prompt order.
    ///
    /// Values are returned as given; [`SimConfig::normalized`] orders the run
    /// time bounds.
    pub fn resolve_with<F>(self, mut ask: F) -> Result<SimConfig, ConfigError>
    where
        F: FnMut(Field) -> Result<u64, ConfigError>,
    {
        let mut value = |field: Field| match self.get(field) {
            Some(v) => Ok(v),
            None => ask(field),
        };

        let instances = value(Field::Instances)?;
        let config = SimConfig {
            instances: u32::try_from(instances).map_err(|_| ConfigError::InvalidNumber {
                field: Field::Instances.name(),
                input: instances.to_string(),
            })?,
            tanks: value(Field::Tanks)?,
            healers: value(Field::Healers)?,
            dps: value(Field::Dps)?,
            min_time: value(Field::MinTime)?,
            max_time: value(Field::MaxTime)?,
            seed: self.seed,
        };
        Ok(config)
    }
}
