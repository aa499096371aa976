//! Plain configuration for the reference simulation cores.

use std::collections::HashMap;

use crate::core::{GymError, Result};

/// Key-value kwargs for `registry::create`. Stringly-typed, parsed by `EnvConfig::from_kwargs`.
pub type KwArgs = HashMap<String, String>;

/// Lane count and episode timing shared by every built-in core.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvConfig {
    pub batch_size: usize,
    /// Episodes end once a lane's step count reaches this value.
    pub episode_length: u32,
    /// Physics substeps per call; also the step count increment.
    pub action_repeat: u32,
}

impl Default for EnvConfig {
    fn default() -> Self { Self { batch_size: 1, episode_length: 1000, action_repeat: 1 } }
}

impl EnvConfig {
    pub fn new(batch_size: usize, episode_length: u32) -> Self {
        Self { batch_size, episode_length, ..Self::default() }
    }

    pub fn with_action_repeat(mut self, action_repeat: u32) -> Self {
        self.action_repeat = action_repeat;
        self
    }

    /// Parse kwargs over the defaults. Unknown keys are rejected.
    pub fn from_kwargs(kwargs: &KwArgs) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in kwargs {
            match key.as_str() {
                "batch_size" => config.batch_size = parse(key, value)?,
                "episode_length" => config.episode_length = parse(key, value)?,
                "action_repeat" => config.action_repeat = parse(key, value)?,
                other => return Err(GymError::Config(format!("unknown key {other:?}"))),
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(GymError::Config("batch_size must be > 0".into()));
        }
        if self.episode_length == 0 {
            return Err(GymError::Config("episode_length must be > 0".into()));
        }
        if self.action_repeat == 0 {
            return Err(GymError::Config("action_repeat must be > 0".into()));
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GymError::Config(format!("cannot parse {key}={value:?}")))
}
