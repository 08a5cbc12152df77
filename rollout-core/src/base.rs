//! Core functionalities.
mod env;
mod id;
mod multi_agent;
mod policy;
mod policy_map;
mod single_agent;
mod step;
pub use env::{ActionSpaceKind, Env};
pub use id::{AgentId, PolicyId, ALL_AGENTS};
pub use multi_agent::{AgentMap, Dones, MultiAgentEnv, MultiAgentStep};
pub use policy::{HiddenState, Policy, PolicyOutput};
pub use policy_map::{default_policy_mapping, PolicyKind, PolicyMap, PolicyMapping};
pub use single_agent::SingleAgent;
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment, given to a single agent.
pub trait Obs: Clone + Debug {}

/// An action of a single agent.
///
/// Policies may emit actions batched along the first axis and, for tuple action
/// spaces, structured as a tuple of components. [`normalize_action`] uses the methods
/// below to turn such an action into the unbatched form the environment expects.
///
/// [`normalize_action`]: crate::normalize_action
pub trait Act: Clone + Debug {
    /// Returns the number of actions in the object.
    fn len(&self) -> usize {
        1
    }

    /// Returns the number of components if the action is tuple-structured.
    fn tuple_arity(&self) -> Option<usize> {
        None
    }

    /// Returns the action at index `ix` of the batch, `None` if out of range.
    fn unbatch(&self, ix: usize) -> Option<Self> {
        match ix {
            0 => Some(self.clone()),
            _ => None,
        }
    }
}
