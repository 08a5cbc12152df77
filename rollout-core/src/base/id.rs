//! Identifiers of agents and policies.
use serde::{Deserialize, Serialize};
use std::fmt;

const DUMMY_AGENT_ID: &str = "agent0";
const DEFAULT_POLICY_ID: &str = "default_policy";

/// Key of the all-agents flag in the done map of a multi-agent environment.
pub const ALL_AGENTS: &str = "__all__";

/// Identifier of a controllable entity in an environment.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Constructs an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier of the only agent in a single-agent environment.
    pub fn dummy() -> Self {
        Self::new(DUMMY_AGENT_ID)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a policy instance.
///
/// Several agents may be controlled by the policy of the same id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyId(String);

impl PolicyId {
    /// Constructs an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id every agent is mapped to by [`default_policy_mapping`].
    ///
    /// [`default_policy_mapping`]: crate::default_policy_mapping
    pub fn default_policy() -> Self {
        Self::new(DEFAULT_POLICY_ID)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PolicyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PolicyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
