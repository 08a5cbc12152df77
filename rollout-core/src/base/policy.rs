//! Policy.
use super::MultiAgentEnv;
use crate::record::Record;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Hidden state of a recurrent policy.
///
/// A list of flat arrays, e.g. the hidden and cell states of an LSTM.
/// The driver never looks inside; it only hands back what the policy returned.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HiddenState(pub Vec<Vec<f32>>);

impl HiddenState {
    /// Hidden state of arrays filled with zeros, one array per given size.
    pub fn zeros(sizes: &[usize]) -> Self {
        Self(sizes.iter().map(|n| vec![0f32; *n]).collect())
    }

    /// Returns `true` if the state has no arrays.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of [`Policy::compute_action`].
#[derive(Debug)]
pub struct PolicyOutput<A> {
    /// Action.
    pub act: A,

    /// Next hidden state. Required from recurrent policies, ignored otherwise.
    pub state: Option<HiddenState>,

    /// Additional values computed with the action, e.g. value estimates.
    pub extras: Record,
}

impl<A> PolicyOutput<A> {
    /// Output with an action only.
    pub fn new(act: A) -> Self {
        Self {
            act,
            state: None,
            extras: Record::empty(),
        }
    }

    /// Sets the next hidden state.
    pub fn state(mut self, state: HiddenState) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the extras.
    pub fn extras(mut self, extras: Record) -> Self {
        self.extras = extras;
        self
    }
}

/// A trained policy on an environment.
///
/// Policy is a mapping from an observation, together with the previous action and
/// reward of the same agent, to an action. Recurrent policies also carry a hidden
/// state from one decision to the next; a policy is recurrent if
/// [`Policy::initial_state`] returns a non-empty state.
pub trait Policy<E: MultiAgentEnv> {
    /// Computes an action.
    ///
    /// `state` is the hidden state returned at the previous decision of the same agent
    /// (or the initial state at the first decision) for recurrent policies and always
    /// `None` for stateless ones.
    fn compute_action(
        &mut self,
        obs: &E::Obs,
        state: Option<&HiddenState>,
        prev_act: &E::Act,
        prev_reward: f32,
    ) -> Result<PolicyOutput<E::Act>>;

    /// Initial hidden state, `None` for stateless policies.
    fn initial_state(&self) -> Option<HiddenState> {
        None
    }

    /// Samples an action from the action space.
    ///
    /// Used as the previous action at the first decision of an agent.
    fn sample_action(&mut self) -> E::Act;
}
