//! Multi-agent environment.
use super::{id::ALL_AGENTS, ActionSpaceKind, Act, AgentId, Info, Obs};
use crate::{error::RolloutError, record::Record};
use anyhow::Result;
use std::collections::BTreeMap;

/// Values keyed by agent.
///
/// Ordered by [`AgentId`], so agents are visited in the same order at every step.
pub type AgentMap<T> = BTreeMap<AgentId, T>;

/// Termination flags of a multi-agent step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dones {
    /// Per-agent flags.
    pub agents: AgentMap<bool>,

    /// Set when the episode is over for all agents.
    pub all: bool,
}

impl Dones {
    /// Flags of a single-agent environment, keyed by [`AgentId::dummy()`].
    pub fn single(done: bool) -> Self {
        Self {
            agents: AgentMap::from([(AgentId::dummy(), done)]),
            all: done,
        }
    }

    /// Splits a done map carrying the [`ALL_AGENTS`] sentinel into per-agent flags
    /// and the all-agents flag.
    pub fn from_map<K, I>(map: I) -> Result<Self, RolloutError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        let mut agents = AgentMap::new();
        let mut all = None;
        for (k, done) in map {
            let k = k.into();
            if k == ALL_AGENTS {
                all = Some(done);
            } else {
                agents.insert(AgentId::from(k), done);
            }
        }

        Ok(Self {
            agents,
            all: all.ok_or(RolloutError::MissingAllAgentsFlag)?,
        })
    }

    /// Returns the flag of the given agent, `false` if the agent is unknown.
    pub fn is_done(&self, agent_id: &AgentId) -> bool {
        self.agents.get(agent_id).copied().unwrap_or(false)
    }
}

/// Outcome of a step of a [`MultiAgentEnv`].
pub struct MultiAgentStep<E: MultiAgentEnv> {
    /// Observations. `None` marks an agent without an observation at this step.
    pub obs: AgentMap<Option<E::Obs>>,

    /// Rewards.
    pub reward: AgentMap<f32>,

    /// Termination flags.
    pub dones: Dones,

    /// Information defined by user.
    pub info: E::Info,
}

/// Represents an environment with one or more agents acting simultaneously.
///
/// Observations, rewards and termination flags are keyed by [`AgentId`].
/// An agent whose observation is `None` takes no action at that step.
pub trait MultiAgentEnv {
    /// Configurations.
    type Config: Clone;

    /// Observation of an agent.
    type Obs: Obs;

    /// Action of an agent.
    type Act: Act;

    /// Information in the [`MultiAgentStep`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observations.
    fn reset(&mut self) -> Result<AgentMap<Option<Self::Obs>>>;

    /// Resets the environment with a given index, see [`Env::reset_with_index`].
    ///
    /// [`Env::reset_with_index`]: crate::Env::reset_with_index
    fn reset_with_index(&mut self, ix: usize) -> Result<AgentMap<Option<Self::Obs>>> {
        let _ = ix;
        self.reset()
    }

    /// Applies the joint action.
    fn step(&mut self, acts: &AgentMap<Self::Act>) -> Result<(MultiAgentStep<Self>, Record)>
    where
        Self: Sized;

    /// Renders the current state.
    fn render(&mut self) -> Result<()> {
        Ok(())
    }

    /// Structure of the action space of every agent.
    fn action_space(&self) -> ActionSpaceKind {
        ActionSpaceKind::Flat
    }

    /// Returns `true` if [`MultiAgentEnv::step`] may be called after all agents are done.
    fn steps_past_done(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_dones_from_map() {
        let map = HashMap::from([("a", true), ("b", false), (ALL_AGENTS, false)]);
        let dones = Dones::from_map(map).unwrap();
        assert!(!dones.all);
        assert_eq!(dones.agents.len(), 2);
        assert!(dones.is_done(&AgentId::from("a")));
        assert!(!dones.is_done(&AgentId::from("b")));
        assert!(!dones.is_done(&AgentId::from("c")));
    }

    #[test]
    fn test_dones_from_map_without_sentinel() {
        let map = vec![("a".to_string(), true)];
        assert!(matches!(
            Dones::from_map(map),
            Err(RolloutError::MissingAllAgentsFlag)
        ));
    }

    #[test]
    fn test_dones_single() {
        let dones = Dones::single(true);
        assert!(dones.all);
        assert!(dones.is_done(&AgentId::dummy()));
    }
}
