//! Adapter exposing a single-agent environment as a multi-agent one.
use super::{ActionSpaceKind, AgentId, AgentMap, Dones, Env, MultiAgentEnv, MultiAgentStep};
use crate::{error::RolloutError, record::Record};
use anyhow::Result;

/// Wraps an [`Env`] so that it can be driven as a [`MultiAgentEnv`].
///
/// The only agent is [`AgentId::dummy()`]. Its observation is always present, its
/// reward is the scalar reward of the wrapped environment and the all-agents done flag
/// is the done flag of the wrapped environment.
pub struct SingleAgent<E: Env> {
    env: E,
    agent_id: AgentId,
}

impl<E: Env> SingleAgent<E> {
    /// Wraps the given environment.
    pub fn new(env: E) -> Self {
        Self {
            env,
            agent_id: AgentId::dummy(),
        }
    }

    /// Returns a reference to the wrapped environment.
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// Returns a mutable reference to the wrapped environment.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Unwraps the environment.
    pub fn into_inner(self) -> E {
        self.env
    }

    fn wrap_obs(&self, obs: E::Obs) -> AgentMap<Option<E::Obs>> {
        AgentMap::from([(self.agent_id.clone(), Some(obs))])
    }
}

impl<E: Env> MultiAgentEnv for SingleAgent<E> {
    type Config = E::Config;
    type Obs = E::Obs;
    type Act = E::Act;
    type Info = E::Info;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self::new(E::build(config, seed)?))
    }

    fn reset(&mut self) -> Result<AgentMap<Option<Self::Obs>>> {
        let obs = self.env.reset()?;
        Ok(self.wrap_obs(obs))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<AgentMap<Option<Self::Obs>>> {
        let obs = self.env.reset_with_index(ix)?;
        Ok(self.wrap_obs(obs))
    }

    fn step(&mut self, acts: &AgentMap<Self::Act>) -> Result<(MultiAgentStep<Self>, Record)> {
        let act = acts.get(&self.agent_id).ok_or_else(|| {
            RolloutError::ActionSpaceMismatch(format!("no action for agent {}", self.agent_id))
        })?;
        let (step, record) = self.env.step(act)?;
        let dones = Dones::single(step.is_done());
        let step = MultiAgentStep {
            obs: self.wrap_obs(step.obs),
            reward: AgentMap::from([(self.agent_id.clone(), step.reward)]),
            dones,
            info: step.info,
        };

        Ok((step, record))
    }

    fn render(&mut self) -> Result<()> {
        self.env.render()
    }

    fn action_space(&self) -> ActionSpaceKind {
        self.env.action_space()
    }

    fn steps_past_done(&self) -> bool {
        self.env.steps_past_done()
    }
}
