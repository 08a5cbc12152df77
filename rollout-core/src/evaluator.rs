//! Evaluate policies.
use crate::{
    record::{NullRecorder, Record},
    MultiAgentEnv, Rollout,
};
use anyhow::{bail, Result};

/// Evaluate policies on an environment.
pub trait Evaluator<E: MultiAgentEnv> {
    /// Runs the evaluation and returns the results.
    ///
    /// The record has the mean episode reward under the key `Episode return`.
    fn evaluate(&mut self) -> Result<Record>;
}

impl<E: MultiAgentEnv> Evaluator<E> for Rollout<E> {
    /// Runs [`Rollout::run`] and averages the rewards of the episodes.
    fn evaluate(&mut self) -> Result<Record> {
        let episodes = self.run(&mut NullRecorder {})?;
        if episodes.is_empty() {
            bail!("No episode was run in the evaluation");
        }

        let r_total: f32 = episodes.iter().map(|e| e.reward).sum();
        let name = "Episode return";
        Ok(Record::from_scalar(name, r_total / episodes.len() as f32))
    }
}
