//! Cart-pole environments.
//!
//! [`CartPole`] is the single-agent task and [`MultiCartPole`] runs several
//! independent carts, one agent each. Both take [`CartPoleAct`] and give
//! [`CartPoleObs`], which convert from and into [`Mat`](rollout_policy_no_backend::Mat)
//! so that the policies of `rollout-policy-no-backend` can drive them.
mod base;
mod config;
mod env;
mod multi;
pub use base::{CartPoleAct, CartPoleObs};
pub use config::CartPoleConfig;
pub use env::CartPole;
pub use multi::{MultiCartPole, MultiCartPoleConfig};
