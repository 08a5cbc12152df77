//! Registry of policies and the mapping from agents to policies.
use super::{AgentId, HiddenState, MultiAgentEnv, Policy, PolicyId};
use crate::error::RolloutError;
use std::collections::BTreeMap;

/// Maps an agent to the id of the policy controlling it.
///
/// The mapping may be stochastic; [`PolicyBinding`](crate::PolicyBinding) calls it once
/// per agent and episode and keeps the result for the rest of the episode.
pub trait PolicyMapping {
    /// Returns the id of the policy for the agent.
    fn map(&mut self, agent_id: &AgentId) -> PolicyId;
}

impl<F> PolicyMapping for F
where
    F: FnMut(&AgentId) -> PolicyId,
{
    fn map(&mut self, agent_id: &AgentId) -> PolicyId {
        self(agent_id)
    }
}

/// Maps every agent to [`PolicyId::default_policy()`].
pub fn default_policy_mapping(_agent_id: &AgentId) -> PolicyId {
    PolicyId::default_policy()
}

/// Capability of a policy with respect to hidden state.
#[derive(Clone, Debug, PartialEq)]
pub enum PolicyKind {
    /// The policy does not carry hidden state.
    Stateless,

    /// The policy carries hidden state, starting from the given one.
    Recurrent(HiddenState),
}

impl PolicyKind {
    /// Classifies a policy by its initial state. An empty state means stateless.
    pub fn from_initial_state(state: Option<HiddenState>) -> Self {
        match state {
            Some(state) if !state.is_empty() => Self::Recurrent(state),
            _ => Self::Stateless,
        }
    }

    /// Returns `true` for [`PolicyKind::Recurrent`].
    pub fn is_recurrent(&self) -> bool {
        matches!(self, Self::Recurrent(_))
    }

    /// Hidden state an agent starts an episode with.
    pub fn initial_state(&self) -> Option<HiddenState> {
        match self {
            Self::Stateless => None,
            Self::Recurrent(state) => Some(state.clone()),
        }
    }
}

struct PolicyEntry<E: MultiAgentEnv> {
    policy: Box<dyn Policy<E>>,
    kind: PolicyKind,
}

/// Policies keyed by [`PolicyId`].
///
/// The [`PolicyKind`] of each policy is determined once, when it is inserted.
pub struct PolicyMap<E: MultiAgentEnv> {
    entries: BTreeMap<PolicyId, PolicyEntry<E>>,
}

impl<E: MultiAgentEnv> Default for PolicyMap<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<E: MultiAgentEnv> PolicyMap<E> {
    /// Constructs an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding one policy under [`PolicyId::default_policy()`].
    pub fn single(policy: impl Policy<E> + 'static) -> Self {
        Self::new().with(PolicyId::default_policy(), policy)
    }

    /// Adds a policy, replacing any policy registered under the same id.
    pub fn insert(&mut self, id: impl Into<PolicyId>, policy: impl Policy<E> + 'static) {
        let kind = PolicyKind::from_initial_state(policy.initial_state());
        self.entries.insert(
            id.into(),
            PolicyEntry {
                policy: Box::new(policy),
                kind,
            },
        );
    }

    /// Adds a policy and returns the map.
    pub fn with(mut self, id: impl Into<PolicyId>, policy: impl Policy<E> + 'static) -> Self {
        self.insert(id, policy);
        self
    }

    /// Returns the kind of the policy.
    pub fn kind(&self, id: &PolicyId) -> Option<&PolicyKind> {
        self.entries.get(id).map(|e| &e.kind)
    }

    /// Returns the ids of the registered policies.
    pub fn ids(&self) -> impl Iterator<Item = &PolicyId> {
        self.entries.keys()
    }

    /// Returns the number of policies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no policy is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the policy and its kind.
    pub(crate) fn get_mut(
        &mut self,
        id: &PolicyId,
    ) -> Result<(&mut dyn Policy<E>, &PolicyKind), RolloutError> {
        match self.entries.get_mut(id) {
            Some(entry) => Ok((entry.policy.as_mut(), &entry.kind)),
            None => Err(RolloutError::UnknownPolicy(id.clone())),
        }
    }
}
