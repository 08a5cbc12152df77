//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Structure of the action space of an environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSpaceKind {
    /// A single, unstructured action.
    Flat,

    /// A tuple of the given number of components.
    ///
    /// Policies emit batched tuple actions for such spaces, which are unbatched
    /// before being applied to the environment.
    Tuple(usize),
}

impl Default for ActionSpaceKind {
    fn default() -> Self {
        Self::Flat
    }
}

/// Represents a single-agent environment, typically an MDP.
///
/// Wrap it with [`SingleAgent`](crate::SingleAgent) to drive it with
/// [`Rollout`](crate::Rollout).
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [self::Step] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Resets the environment.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way, for example as a random seed,
    /// which makes evaluation runs reproducible. [`Rollout`](crate::Rollout) passes
    /// the index of the episode being started.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        let _ = ix;
        self.reset()
    }

    /// Renders the current state.
    fn render(&mut self) -> Result<()> {
        Ok(())
    }

    /// Structure of the action space.
    fn action_space(&self) -> ActionSpaceKind {
        ActionSpaceKind::Flat
    }

    /// Returns `true` if [`Env::step`] may be called after the episode is done.
    ///
    /// When `false`, a frame-skip group stops at the frame the episode ends.
    fn steps_past_done(&self) -> bool {
        true
    }
}
