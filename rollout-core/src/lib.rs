#![warn(missing_docs)]
//! Core of the rollout harness.
//!
//! A trained policy is evaluated by driving it through an environment with
//! [`Rollout`]. The crate defines the traits the driver consumes
//! ([`Env`], [`MultiAgentEnv`], [`Policy`], [`PolicyMapping`]) and the
//! components the driver is built from:
//!
//! * [`PolicyBinding`] caches which policy controls each agent within an episode.
//! * [`AgentStates`] keeps hidden state, previous action and previous reward per agent.
//! * [`FrameSkip`] repeats an action over several raw simulation frames.
//! * [`RenderPacer`] keeps rendered frames at a target frame rate.
pub mod dummy;
pub mod error;
pub mod record;

mod base;
pub use base::{
    default_policy_mapping, Act, ActionSpaceKind, AgentId, AgentMap, Dones, Env, HiddenState,
    Info, MultiAgentEnv, MultiAgentStep, Obs, Policy, PolicyId, PolicyKind, PolicyMap,
    PolicyMapping, PolicyOutput, SingleAgent, Step, ALL_AGENTS,
};

mod evaluator;
pub use evaluator::Evaluator;

mod rollout;
pub use rollout::{
    normalize_action, pace, AgentState, AgentStates, Episode, EpisodeStats, FrameSkip,
    FrameSkipStep, PolicyBinding, RenderPacer, Rollout, RolloutConfig, ZeroBudget,
};
