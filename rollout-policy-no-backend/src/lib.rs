//! Policies running on plain Rust matrices, without a deep learning backend.
//!
//! Trained parameters are exported to [`bincode`] files and loaded with
//! [`MlpPolicy::from_serialized_path`] or [`RnnPolicy::from_serialized_path`].
//! Observations are given to the policies as column [`Mat`]s; actions are returned as
//! [`Mat`]s and converted to the action type of the environment with [`From`].
mod mat;
mod mlp;
mod mlp_policy;
mod rnn_policy;
pub use mat::Mat;
pub use mlp::{Mlp, OutputActivation};
pub use mlp_policy::{ActionHead, MlpPolicy};
pub use rnn_policy::{Rnn, RnnPolicy};
