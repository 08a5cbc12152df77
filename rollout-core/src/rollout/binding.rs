use crate::{AgentId, AgentMap, PolicyId, PolicyMapping};
use log::trace;

/// Binding of agents to policies within an episode.
///
/// The policy mapping is called once per agent; the result is kept until the
/// binding is dropped with its [`Episode`](super::Episode). This makes stochastic
/// mappings stable within an episode while allowing them to vary across episodes.
#[derive(Debug, Default)]
pub struct PolicyBinding {
    cache: AgentMap<PolicyId>,
}

impl PolicyBinding {
    /// Constructs an empty binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the policy id of the agent, calling `mapping` if the agent is not bound yet.
    pub fn resolve<M>(&mut self, agent_id: &AgentId, mapping: &mut M) -> PolicyId
    where
        M: PolicyMapping + ?Sized,
    {
        if let Some(policy_id) = self.cache.get(agent_id) {
            return policy_id.clone();
        }

        let policy_id = mapping.map(agent_id);
        trace!("Bind {} to {}", agent_id, policy_id);
        self.cache.insert(agent_id.clone(), policy_id.clone());
        policy_id
    }

    /// Returns the policy id of the agent if already bound.
    pub fn get(&self, agent_id: &AgentId) -> Option<&PolicyId> {
        self.cache.get(agent_id)
    }

    /// Returns the number of bound agents.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns `true` if no agent is bound.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
