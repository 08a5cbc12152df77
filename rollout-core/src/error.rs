//! Errors in the library.
use crate::PolicyId;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum RolloutError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The action computed by a policy does not fit the action space of the environment.
    #[error("Action space mismatch: {0}")]
    ActionSpaceMismatch(String),

    /// The policy mapping returned an id with no registered policy.
    #[error("No policy is registered for {0}")]
    UnknownPolicy(PolicyId),

    /// A recurrent policy did not return the next hidden state.
    #[error("Recurrent policy {0} returned no hidden state")]
    MissingHiddenState(PolicyId),

    /// The done flags of a multi-agent step lack the `"__all__"` entry.
    #[error("Done flags have no \"__all__\" entry")]
    MissingAllAgentsFlag,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
