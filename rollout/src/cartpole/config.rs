use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`CartPole`](super::CartPole) and [`MultiCartPole`](super::MultiCartPole).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CartPoleConfig {
    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,

    /// Initial state values are drawn uniformly from `[-init_range, init_range]`.
    pub init_range: f32,

    /// Width of the track in characters when rendered.
    pub render_width: usize,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            max_steps: 500,
            init_range: 0.05,
            render_width: 41,
        }
    }
}

impl CartPoleConfig {
    /// Sets the maximum number of steps of an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the range of the initial state.
    pub fn init_range(mut self, v: f32) -> Self {
        self.init_range = v;
        self
    }

    /// Sets the width of the rendered track.
    pub fn render_width(mut self, v: usize) -> Self {
        self.render_width = v;
        self
    }

    /// Constructs [`CartPoleConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open env config {:?}", path))?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Ok(config)
    }

    /// Saves [`CartPoleConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
