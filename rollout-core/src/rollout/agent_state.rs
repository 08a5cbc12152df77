use crate::{AgentId, AgentMap, HiddenState};

/// Per-agent state carried from one decision to the next within an episode.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentState<A> {
    /// Hidden state of the bound policy, `None` if it is stateless.
    pub hidden: Option<HiddenState>,

    /// Action taken at the previous decision.
    pub prev_act: A,

    /// Reward aggregated over the previous frame-skip group.
    pub prev_reward: f32,
}

impl<A> AgentState<A> {
    /// State of an agent before its first decision.
    pub fn new(hidden: Option<HiddenState>, prev_act: A) -> Self {
        Self {
            hidden,
            prev_act,
            prev_reward: 0.0,
        }
    }

    /// Records a decision.
    ///
    /// `hidden` is `Some` only for recurrent policies; for stateless ones the
    /// state is left untouched.
    pub fn record_decision(&mut self, act: A, hidden: Option<HiddenState>) {
        self.prev_act = act;
        if hidden.is_some() {
            self.hidden = hidden;
        }
    }
}

/// Per-agent states of an episode.
///
/// An entry is created lazily, the first time an agent has an observation.
#[derive(Debug)]
pub struct AgentStates<A> {
    states: AgentMap<AgentState<A>>,
}

impl<A> Default for AgentStates<A> {
    fn default() -> Self {
        Self {
            states: AgentMap::new(),
        }
    }
}

impl<A> AgentStates<A> {
    /// Constructs an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state of the agent, creating it with `init` at the first access.
    pub fn get_or_init<F>(&mut self, agent_id: &AgentId, init: F) -> &mut AgentState<A>
    where
        F: FnOnce() -> AgentState<A>,
    {
        self.states.entry(agent_id.clone()).or_insert_with(init)
    }

    /// Returns the state of the agent if it exists.
    pub fn get(&self, agent_id: &AgentId) -> Option<&AgentState<A>> {
        self.states.get(agent_id)
    }

    /// Sets the reward aggregated over the last frame-skip group.
    ///
    /// Agents that have not acted yet in this episode are ignored.
    pub fn set_prev_reward(&mut self, agent_id: &AgentId, reward: f32) {
        if let Some(state) = self.states.get_mut(agent_id) {
            state.prev_reward = reward;
        }
    }

    /// Returns the number of agents with a state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if no agent has a state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
