//! This module is used for tests.
use crate::{
    record::{Record, RecordValue},
    Act, ActionSpaceKind, AgentId, AgentMap, Dones, Env, HiddenState, Info, MultiAgentEnv,
    MultiAgentStep, Obs, Policy, PolicyOutput, Step,
};
use anyhow::{bail, Result};
use std::{cell::RefCell, rc::Rc};

/// Dummy observation, the number of steps taken in the episode.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyObs(pub usize);

impl Obs for DummyObs {}

/// Dummy action.
#[derive(Clone, Debug, PartialEq)]
pub enum DummyAct {
    /// A flat action.
    Flat(i64),

    /// A tuple action, each component batched along the inner vector.
    Tuple(Vec<Vec<i64>>),
}

impl Act for DummyAct {
    fn len(&self) -> usize {
        match self {
            Self::Flat(_) => 1,
            Self::Tuple(c) => c.first().map_or(0, |v| v.len()),
        }
    }

    fn tuple_arity(&self) -> Option<usize> {
        match self {
            Self::Flat(_) => None,
            Self::Tuple(c) => Some(c.len()),
        }
    }

    fn unbatch(&self, ix: usize) -> Option<Self> {
        match self {
            Self::Flat(_) if ix == 0 => Some(self.clone()),
            Self::Flat(_) => None,
            Self::Tuple(c) => c
                .iter()
                .map(|v| v.get(ix).map(|a| vec![*a]))
                .collect::<Option<Vec<_>>>()
                .map(Self::Tuple),
        }
    }
}

/// Dummy info.
#[derive(Clone, Debug)]
pub struct DummyInfo;

impl Info for DummyInfo {}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Rewards of the steps of an episode, repeated cyclically. `1.0` at every step if empty.
    pub rewards: Vec<f32>,

    /// The number of steps after which the episode is terminated. Never if `None`.
    pub episode_len: Option<usize>,

    /// If `false`, stepping after the end of the episode is an error.
    pub steps_past_done: bool,

    /// Action space.
    pub action_space: ActionSpaceKind,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            rewards: vec![],
            episode_len: None,
            steps_past_done: true,
            action_space: ActionSpaceKind::Flat,
        }
    }
}

impl DummyEnvConfig {
    /// Sets the rewards.
    pub fn rewards(mut self, v: Vec<f32>) -> Self {
        self.rewards = v;
        self
    }

    /// Sets the episode length.
    pub fn episode_len(mut self, v: Option<usize>) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets whether steps after the end of the episode are accepted.
    pub fn steps_past_done(mut self, v: bool) -> Self {
        self.steps_past_done = v;
        self
    }

    /// Sets the action space.
    pub fn action_space(mut self, v: ActionSpaceKind) -> Self {
        self.action_space = v;
        self
    }
}

/// Dummy single-agent environment counting its interactions.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
    total_steps: usize,
    n_resets: usize,
    n_renders: usize,
    acts: Vec<DummyAct>,
    reset_indices: Vec<usize>,
}

impl DummyEnv {
    /// Actions applied so far, over all episodes.
    pub fn acts(&self) -> &Vec<DummyAct> {
        &self.acts
    }

    /// The number of steps over all episodes.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// The number of resets.
    pub fn n_resets(&self) -> usize {
        self.n_resets
    }

    /// The number of rendered frames.
    pub fn n_renders(&self) -> usize {
        self.n_renders
    }

    /// Indices given to [`Env::reset_with_index`].
    pub fn reset_indices(&self) -> &Vec<usize> {
        &self.reset_indices
    }

    fn reward(&self, t: usize) -> f32 {
        match self.config.rewards.len() {
            0 => 1.0,
            n => self.config.rewards[t % n],
        }
    }

    fn is_over(&self) -> bool {
        self.config.episode_len.map_or(false, |n| self.t >= n)
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = DummyInfo;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            total_steps: 0,
            n_resets: 0,
            n_renders: 0,
            acts: vec![],
            reset_indices: vec![],
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        if self.is_over() && !self.config.steps_past_done {
            bail!("Step after the end of the episode");
        }

        let reward = self.reward(self.t);
        self.t += 1;
        self.total_steps += 1;
        self.acts.push(a.clone());

        let step = Step::new(
            DummyObs(self.t),
            a.clone(),
            reward,
            self.is_over(),
            false,
            DummyInfo,
        );
        Ok((step, Record::from_scalar("env_step", self.t as f32)))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        self.n_resets += 1;
        Ok(DummyObs(0))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.reset_indices.push(ix);
        self.reset()
    }

    fn render(&mut self) -> Result<()> {
        self.n_renders += 1;
        Ok(())
    }

    fn action_space(&self) -> ActionSpaceKind {
        self.config.action_space
    }

    fn steps_past_done(&self) -> bool {
        self.config.steps_past_done
    }
}

/// Configuration of [`DummyMultiAgentEnv`].
#[derive(Clone, Debug, Default)]
pub struct DummyMultiAgentEnvConfig {
    /// Episode length of each agent.
    pub episode_lens: AgentMap<usize>,

    /// Reward of each agent per step, `1.0` if not given.
    pub rewards: AgentMap<f32>,
}

impl DummyMultiAgentEnvConfig {
    /// Adds an agent acting for `episode_len` steps.
    pub fn agent(mut self, agent_id: impl Into<AgentId>, episode_len: usize) -> Self {
        self.episode_lens.insert(agent_id.into(), episode_len);
        self
    }

    /// Sets the reward an agent receives per step.
    pub fn reward(mut self, agent_id: impl Into<AgentId>, reward: f32) -> Self {
        self.rewards.insert(agent_id.into(), reward);
        self
    }
}

/// Dummy multi-agent environment.
///
/// An agent has no observation and no reward after its own episode ends.
/// The episode is over when all agents are done.
pub struct DummyMultiAgentEnv {
    config: DummyMultiAgentEnvConfig,
    t: usize,
    total_steps: usize,
    acts: Vec<AgentMap<DummyAct>>,
}

impl DummyMultiAgentEnv {
    /// Joint actions applied so far, over all episodes.
    pub fn acts(&self) -> &Vec<AgentMap<DummyAct>> {
        &self.acts
    }

    /// The number of steps over all episodes.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl MultiAgentEnv for DummyMultiAgentEnv {
    type Config = DummyMultiAgentEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = DummyInfo;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            total_steps: 0,
            acts: vec![],
        })
    }

    fn reset(&mut self) -> Result<AgentMap<Option<Self::Obs>>> {
        self.t = 0;
        Ok(self
            .config
            .episode_lens
            .keys()
            .map(|id| (id.clone(), Some(DummyObs(0))))
            .collect())
    }

    fn step(&mut self, acts: &AgentMap<Self::Act>) -> Result<(MultiAgentStep<Self>, Record)> {
        for (agent_id, len) in self.config.episode_lens.iter() {
            if self.t < *len && !acts.contains_key(agent_id) {
                bail!("No action for agent {}", agent_id);
            }
        }

        let alive: Vec<_> = self
            .config
            .episode_lens
            .iter()
            .filter(|(_, len)| self.t < **len)
            .map(|(id, _)| id.clone())
            .collect();
        self.t += 1;
        self.total_steps += 1;
        self.acts.push(acts.clone());

        let t = self.t;
        let obs = self
            .config
            .episode_lens
            .iter()
            .map(|(id, len)| (id.clone(), (t < *len).then(|| DummyObs(t))))
            .collect();
        let reward = alive
            .into_iter()
            .map(|id| {
                let r = self.config.rewards.get(&id).copied().unwrap_or(1.0);
                (id, r)
            })
            .collect();
        let agents: AgentMap<bool> = self
            .config
            .episode_lens
            .iter()
            .map(|(id, len)| (id.clone(), t >= *len))
            .collect();
        let all = agents.values().all(|done| *done);
        let step = MultiAgentStep {
            obs,
            reward,
            dones: Dones { agents, all },
            info: DummyInfo,
        };

        Ok((step, Record::empty()))
    }
}

/// Arguments of a call of [`DummyPolicy`].
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyCall {
    /// Observation.
    pub obs: usize,

    /// Hidden state given to the policy.
    pub state: Option<HiddenState>,

    /// Previous action.
    pub prev_act: DummyAct,

    /// Previous reward.
    pub prev_reward: f32,
}

/// Log of the calls of [`DummyPolicy`], shared with the test.
pub type PolicyCalls = Rc<RefCell<Vec<PolicyCall>>>;

/// Dummy policy.
///
/// Emits `Flat(tag + obs)`, or a batch of two tuple actions whose first entries are
/// `tag + obs + i` for component `i`. The hidden state of a recurrent dummy policy is a
/// single counter incremented at every call.
pub struct DummyPolicy {
    tag: i64,
    action_space: ActionSpaceKind,
    initial_state: Option<HiddenState>,
    return_state: bool,
    calls: PolicyCalls,
}

impl DummyPolicy {
    /// A stateless policy.
    pub fn new(tag: i64) -> Self {
        Self {
            tag,
            action_space: ActionSpaceKind::Flat,
            initial_state: None,
            return_state: true,
            calls: Rc::new(RefCell::new(vec![])),
        }
    }

    /// A recurrent policy starting from a zero counter.
    pub fn recurrent(tag: i64) -> Self {
        Self::new(tag).initial_state(Some(HiddenState(vec![vec![0.0]])))
    }

    /// Sets the initial state.
    pub fn initial_state(mut self, v: Option<HiddenState>) -> Self {
        self.initial_state = v;
        self
    }

    /// Sets the action space the policy emits actions for.
    pub fn action_space(mut self, v: ActionSpaceKind) -> Self {
        self.action_space = v;
        self
    }

    /// If `false`, no hidden state is returned even for a given state.
    pub fn return_state(mut self, v: bool) -> Self {
        self.return_state = v;
        self
    }

    /// Log of the calls.
    pub fn calls(&self) -> PolicyCalls {
        self.calls.clone()
    }
}

impl<E> Policy<E> for DummyPolicy
where
    E: MultiAgentEnv<Obs = DummyObs, Act = DummyAct>,
{
    fn compute_action(
        &mut self,
        obs: &DummyObs,
        state: Option<&HiddenState>,
        prev_act: &DummyAct,
        prev_reward: f32,
    ) -> Result<PolicyOutput<DummyAct>> {
        self.calls.borrow_mut().push(PolicyCall {
            obs: obs.0,
            state: state.cloned(),
            prev_act: prev_act.clone(),
            prev_reward,
        });

        let a = self.tag + obs.0 as i64;
        let act = match self.action_space {
            ActionSpaceKind::Flat => DummyAct::Flat(a),
            ActionSpaceKind::Tuple(n) => {
                DummyAct::Tuple((0..n as i64).map(|i| vec![a + i, -1]).collect())
            }
        };
        let extras = Record::from_slice(&[("tag", RecordValue::Scalar(self.tag as _))]);
        let out = PolicyOutput::new(act).extras(extras);

        match state {
            Some(HiddenState(s)) if self.return_state => {
                let next = s.iter().map(|v| v.iter().map(|x| x + 1.0).collect()).collect();
                Ok(out.state(HiddenState(next)))
            }
            _ => Ok(out),
        }
    }

    fn initial_state(&self) -> Option<HiddenState> {
        self.initial_state.clone()
    }

    fn sample_action(&mut self) -> DummyAct {
        match self.action_space {
            ActionSpaceKind::Flat => DummyAct::Flat(-1),
            ActionSpaceKind::Tuple(n) => DummyAct::Tuple(vec![vec![-1]; n]),
        }
    }
}
