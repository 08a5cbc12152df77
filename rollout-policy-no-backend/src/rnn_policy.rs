use crate::{
    mlp_policy::{check_input, read_bincode, write_bincode},
    ActionHead, Mat, Mlp,
};
use anyhow::{anyhow, bail, Result};
use log::info;
use rand::Rng;
use rollout_core::{HiddenState, MultiAgentEnv, Policy, PolicyOutput};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Elman recurrent cell, `h' = tanh(wx x + wh h + b)`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Rnn {
    wx: Mat,
    wh: Mat,
    b: Mat,
}

impl Rnn {
    /// Constructs a cell. `wx` is of shape `[hidden, in]`, `wh` of `[hidden, hidden]`
    /// and `b` of `[hidden, 1]`.
    pub fn new(wx: Mat, wh: Mat, b: Mat) -> Result<Self> {
        let rnn = Self { wx, wh, b };
        rnn.validate()?;
        Ok(rnn)
    }

    /// Checks the shapes of the weights.
    pub fn validate(&self) -> Result<()> {
        if self.wx.shape.len() != 2 {
            bail!("Invalid shape of input weights: {:?}", self.wx.shape);
        }
        let n = self.wx.shape[0];
        if self.wh.shape != [n, n] || self.b.shape != [n, 1] {
            bail!(
                "Invalid shapes of recurrent cell: {:?}",
                (&self.wx.shape, &self.wh.shape, &self.b.shape)
            );
        }
        Ok(())
    }

    /// Constructs a cell with weights drawn uniformly from `[-1/sqrt(n), 1/sqrt(n)]`,
    /// `n` being the hidden dimension.
    pub fn random(in_dim: usize, hidden_dim: usize, rng: &mut impl Rng) -> Self {
        let r = 1.0 / (hidden_dim.max(1) as f32).sqrt();
        let mut uniform = |rows: usize, cols: usize| {
            let data = (0..rows * cols).map(|_| rng.gen_range(-r..=r)).collect();
            Mat::new(data, vec![rows as _, cols as _])
        };
        Self {
            wx: uniform(hidden_dim, in_dim),
            wh: uniform(hidden_dim, hidden_dim),
            b: uniform(hidden_dim, 1),
        }
    }

    /// Dimension of the hidden state.
    pub fn hidden_dim(&self) -> usize {
        self.wx.shape[0] as _
    }

    /// Input dimension.
    pub fn in_dim(&self) -> usize {
        self.wx.shape[1] as _
    }

    /// Computes the next hidden state from input `x` and hidden state `h`.
    pub fn forward(&self, x: &Mat, h: &Mat) -> Mat {
        self.wx.matmul(x).add(&self.wh.matmul(h)).add(&self.b).tanh()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct Checkpoint {
    rnn: Rnn,
    mlp: Mlp,
    head: ActionHead,
}

/// Recurrent policy: an [`Rnn`] cell followed by an [`Mlp`] on the new hidden state.
///
/// The hidden state is a single array, zero at the start of an episode.
pub struct RnnPolicy {
    rnn: Rnn,
    mlp: Mlp,
    head: ActionHead,
    rng: fastrand::Rng,
}

impl RnnPolicy {
    /// Constructs a policy. The MLP takes the hidden state as its input.
    pub fn new(rnn: Rnn, mlp: Mlp, head: ActionHead) -> Result<Self> {
        if mlp.in_dim() != rnn.hidden_dim() {
            bail!(
                "MLP takes {} inputs, but the hidden state has {} elements",
                mlp.in_dim(),
                rnn.hidden_dim()
            );
        }
        Ok(Self {
            rnn,
            mlp,
            head,
            rng: fastrand::Rng::with_seed(0),
        })
    }

    /// Sets the seed of the sampler of [`Policy::sample_action`].
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Computes the action and the next hidden state.
    pub fn step(&self, obs: &Mat, hidden: &HiddenState) -> Result<(Mat, HiddenState)> {
        check_input(obs, self.rnn.in_dim())?;
        let h = match hidden.0.as_slice() {
            [h] if h.len() == self.rnn.hidden_dim() => Mat::from(h.clone()),
            _ => bail!("Invalid hidden state of recurrent policy: {:?}", hidden),
        };
        let h = self.rnn.forward(obs, &h);
        let act = self.head.apply(self.mlp.forward(&h))?;
        Ok((act, HiddenState(vec![h.data])))
    }

    /// Loads a policy saved with [`RnnPolicy::save`].
    pub fn from_serialized_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let Checkpoint { rnn, mlp, head } = read_bincode(path)?;
        rnn.validate()?;
        mlp.validate()?;
        info!(
            "Loaded recurrent policy from {:?} (hidden size {})",
            path,
            rnn.hidden_dim()
        );
        Self::new(rnn, mlp, head)
    }

    /// Saves the policy in bincode format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let checkpoint = Checkpoint {
            rnn: self.rnn.clone(),
            mlp: self.mlp.clone(),
            head: self.head,
        };
        write_bincode(&checkpoint, path.as_ref())
    }
}

impl<E> Policy<E> for RnnPolicy
where
    E: MultiAgentEnv,
    E::Obs: Into<Mat>,
    E::Act: From<Mat>,
{
    fn compute_action(
        &mut self,
        obs: &E::Obs,
        state: Option<&HiddenState>,
        _prev_act: &E::Act,
        _prev_reward: f32,
    ) -> Result<PolicyOutput<E::Act>> {
        let state = state.ok_or_else(|| anyhow!("Recurrent policy called without state"))?;
        let (act, state) = self.step(&obs.clone().into(), state)?;
        Ok(PolicyOutput::new(act.into()).state(state))
    }

    fn initial_state(&self) -> Option<HiddenState> {
        Some(HiddenState::zeros(&[self.rnn.hidden_dim()]))
    }

    fn sample_action(&mut self) -> E::Act {
        self.head.sample(self.mlp.out_dim(), &mut self.rng).into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::OutputActivation;
    use tempdir::TempDir;

    // Hidden state of size 1 accumulating the input; the output is the state itself.
    fn policy() -> RnnPolicy {
        let rnn = Rnn::new(
            Mat::new(vec![0.5], vec![1, 1]),
            Mat::new(vec![1.0], vec![1, 1]),
            Mat::zeros(1, 1),
        )
        .unwrap();
        let mlp = Mlp::new(
            vec![Mat::new(vec![1.0], vec![1, 1])],
            vec![Mat::zeros(1, 1)],
            OutputActivation::Identity,
        )
        .unwrap();
        RnnPolicy::new(rnn, mlp, ActionHead::Continuous { scale: 1.0 }).unwrap()
    }

    #[test]
    fn test_state_is_carried() -> Result<()> {
        let policy = policy();
        let h0 = HiddenState::zeros(&[1]);
        let x: Mat = vec![1.0].into();

        let (a1, h1) = policy.step(&x, &h0)?;
        let (a2, h2) = policy.step(&x, &h1)?;
        assert_eq!(h1, HiddenState(vec![vec![0.5f32.tanh()]]));
        assert_eq!(h2, HiddenState(vec![vec![(0.5 + 0.5f32.tanh()).tanh()]]));
        assert_eq!(a1.data, h1.0[0]);
        assert_eq!(a2.data, h2.0[0]);
        Ok(())
    }

    #[test]
    fn test_random_cell() {
        use rand::{rngs::SmallRng, SeedableRng};
        let rnn = Rnn::random(4, 8, &mut SmallRng::seed_from_u64(0));
        assert_eq!(rnn.hidden_dim(), 8);
        assert_eq!(rnn.wx.shape(), &[8, 4]);
        assert!(Rnn::new(rnn.wx.clone(), rnn.wh.clone(), rnn.b.clone()).is_ok());
    }

    #[test]
    fn test_invalid_state() {
        let policy = policy();
        let x: Mat = vec![1.0].into();
        assert!(policy.step(&x, &HiddenState(vec![])).is_err());
        assert!(policy.step(&x, &HiddenState::zeros(&[2])).is_err());
    }

    #[test]
    fn test_observation_of_wrong_size() {
        let policy = policy();
        let x: Mat = vec![1.0, 2.0].into();
        assert!(policy.step(&x, &HiddenState::zeros(&[1])).is_err());
    }

    #[test]
    fn test_malformed_cell() {
        let wx = Mat {
            data: vec![],
            shape: vec![],
        };
        assert!(Rnn::new(wx, Mat::zeros(1, 1), Mat::zeros(1, 1)).is_err());
        assert!(Rnn::new(Mat::zeros(2, 3), Mat::zeros(2, 3), Mat::zeros(2, 1)).is_err());
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("rnn_policy")?;
        let path = dir.path().join("rnn.bincode");
        let policy = policy();
        policy.save(&path)?;

        let policy_ = RnnPolicy::from_serialized_path(&path)?;
        let x: Mat = vec![0.3].into();
        let h = HiddenState(vec![vec![0.1]]);
        assert_eq!(policy.step(&x, &h)?, policy_.step(&x, &h)?);
        Ok(())
    }
}
