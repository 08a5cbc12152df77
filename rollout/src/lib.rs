//! Rollout of trained reinforcement learning policies.
//!
//! The workspace consists of the following crates:
//!
//! * [rollout-core](rollout_core) provides the traits of environments and policies,
//!   and the [`Rollout`](rollout_core::Rollout) driver which runs policies through
//!   episodes with frame skipping and paced rendering.
//! * [rollout-policy-no-backend](rollout_policy_no_backend) includes MLP and recurrent
//!   policies on plain Rust matrices, loaded from bincode files.
//! * This crate has the cart-pole environments and the `enjoy` binary, which rolls out
//!   a policy and reports episode rewards.
pub mod cartpole;
pub use rollout_core as core;
pub use rollout_policy_no_backend as policy;
