//! Configuration of [`Rollout`](super::Rollout).
use crate::error::RolloutError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// What a rollout does when no step budget is given (`max_steps == 0`).
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum ZeroBudget {
    /// Run exactly one episode.
    SingleEpisode,

    /// Run episodes until `max_episodes` is reached, or forever if it is not set.
    Unlimited,
}

impl Default for ZeroBudget {
    fn default() -> Self {
        Self::SingleEpisode
    }
}

/// Configuration of [`Rollout`](super::Rollout).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct RolloutConfig {
    /// The number of raw environment steps an action is repeated for.
    pub frame_skip: usize,

    /// Target frame rate of rendering.
    pub fps: f32,

    /// Budget of raw environment steps over all episodes. `0` means no budget.
    pub max_steps: usize,

    /// If `true`, every raw frame is rendered.
    pub render: bool,

    /// Behavior without step budget.
    pub zero_budget: ZeroBudget,

    /// The maximum number of episodes.
    pub max_episodes: Option<usize>,

    /// If `true`, a record is written to the recorder at every decision.
    pub record_decisions: bool,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            frame_skip: 4,
            fps: 45.0,
            max_steps: 0,
            render: false,
            zero_budget: ZeroBudget::SingleEpisode,
            max_episodes: None,
            record_decisions: false,
        }
    }
}

impl RolloutConfig {
    /// Sets the number of frames an action is repeated for.
    pub fn frame_skip(mut self, v: usize) -> Self {
        self.frame_skip = v;
        self
    }

    /// Sets the target frame rate of rendering.
    pub fn fps(mut self, v: f32) -> Self {
        self.fps = v;
        self
    }

    /// Sets the budget of environment steps.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Enables or disables rendering.
    pub fn render(mut self, v: bool) -> Self {
        self.render = v;
        self
    }

    /// Sets the behavior without step budget.
    pub fn zero_budget(mut self, v: ZeroBudget) -> Self {
        self.zero_budget = v;
        self
    }

    /// Sets the maximum number of episodes.
    pub fn max_episodes(mut self, v: Option<usize>) -> Self {
        self.max_episodes = v;
        self
    }

    /// Enables or disables per-decision records.
    pub fn record_decisions(mut self, v: bool) -> Self {
        self.record_decisions = v;
        self
    }

    /// Checks the values.
    pub fn validate(&self) -> Result<(), RolloutError> {
        if self.frame_skip == 0 {
            return Err(RolloutError::InvalidConfig(
                "frame_skip must be positive".to_string(),
            ));
        }
        if self.render && !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(RolloutError::InvalidConfig(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Constructs [`RolloutConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open rollout config {:?}", path))?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Ok(config)
    }

    /// Saves [`RolloutConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
