use crate::{Mat, Mlp};
use anyhow::{anyhow, bail, Context, Result};
use log::info;
use rollout_core::{HiddenState, MultiAgentEnv, Policy, PolicyOutput};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufWriter, Read},
    path::Path,
};

/// How the output of a network is turned into an action.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub enum ActionHead {
    /// Index of the largest output, as a `[1, 1]` matrix.
    Discrete,

    /// Outputs multiplied by `scale`.
    ///
    /// With [`OutputActivation::Tanh`](crate::OutputActivation::Tanh) the actions
    /// lie in `[-scale, scale]`.
    Continuous { scale: f32 },
}

impl ActionHead {
    pub(crate) fn apply(&self, out: Mat) -> Result<Mat> {
        match self {
            Self::Discrete => {
                let ix = out
                    .argmax()
                    .ok_or_else(|| anyhow!("Empty network output for a discrete action"))?;
                Ok(Mat::new(vec![ix as f32], vec![1, 1]))
            }
            Self::Continuous { scale } => Ok(out.scale(*scale)),
        }
    }

    pub(crate) fn sample(&self, out_dim: usize, rng: &mut fastrand::Rng) -> Mat {
        match self {
            Self::Discrete => Mat::new(vec![rng.usize(..out_dim.max(1)) as f32], vec![1, 1]),
            Self::Continuous { scale } => (0..out_dim)
                .map(|_| (rng.f32() * 2.0 - 1.0) * scale)
                .collect::<Vec<_>>()
                .into(),
        }
    }
}

#[derive(Deserialize, Serialize)]
struct Checkpoint {
    mlp: Mlp,
    head: ActionHead,
}

/// Reads a bincode file.
pub(crate) fn read_bincode<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let mut file = fs::OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let mut buf = Vec::<u8>::new();
    file.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf[..])?)
}

/// Fails unless `obs` is a column of `n_inputs` elements.
pub(crate) fn check_input(obs: &Mat, n_inputs: usize) -> Result<()> {
    if !obs.is_column(n_inputs) {
        bail!(
            "Observation of shape {:?} for a policy taking {} inputs",
            obs.shape(),
            n_inputs
        );
    }
    Ok(())
}

/// Writes a bincode file.
pub(crate) fn write_bincode<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    bincode::serialize_into(BufWriter::new(file), value)?;
    Ok(())
}

/// Stateless policy computing actions with an [`Mlp`].
///
/// Works with any environment whose observations convert into a column [`Mat`]
/// and whose actions convert from one.
pub struct MlpPolicy {
    mlp: Mlp,
    head: ActionHead,
    rng: fastrand::Rng,
}

impl MlpPolicy {
    /// Constructs a policy. The seed of [`Policy::sample_action`] is `0`.
    pub fn new(mlp: Mlp, head: ActionHead) -> Self {
        Self {
            mlp,
            head,
            rng: fastrand::Rng::with_seed(0),
        }
    }

    /// Sets the seed of the sampler of [`Policy::sample_action`].
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// The network.
    pub fn mlp(&self) -> &Mlp {
        &self.mlp
    }

    /// The action head.
    pub fn head(&self) -> ActionHead {
        self.head
    }

    /// Computes the action for an observation.
    pub fn act(&self, obs: &Mat) -> Result<Mat> {
        check_input(obs, self.mlp.in_dim())?;
        self.head.apply(self.mlp.forward(obs))
    }

    /// Loads a policy saved with [`MlpPolicy::save`].
    pub fn from_serialized_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let Checkpoint { mlp, head } = read_bincode(path)?;
        mlp.validate()?;
        info!(
            "Loaded MLP policy from {:?} ({} -> {})",
            path,
            mlp.in_dim(),
            mlp.out_dim()
        );
        Ok(Self::new(mlp, head))
    }

    /// Saves the policy in bincode format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let checkpoint = Checkpoint {
            mlp: self.mlp.clone(),
            head: self.head,
        };
        write_bincode(&checkpoint, path.as_ref())
    }
}

impl<E> Policy<E> for MlpPolicy
where
    E: MultiAgentEnv,
    E::Obs: Into<Mat>,
    E::Act: From<Mat>,
{
    fn compute_action(
        &mut self,
        obs: &E::Obs,
        _state: Option<&HiddenState>,
        _prev_act: &E::Act,
        _prev_reward: f32,
    ) -> Result<PolicyOutput<E::Act>> {
        let act = self.act(&obs.clone().into())?;
        Ok(PolicyOutput::new(act.into()))
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

    fn mlp() -> Mlp {
        let ws = vec![Mat::new(vec![1., 0., 0., 1., -1., -1.], vec![3, 2])];
        let bs = vec![Mat::zeros(3, 1)];
        Mlp::new(ws, bs, OutputActivation::Identity).unwrap()
    }

    #[test]
    fn test_discrete_head() -> Result<()> {
        let policy = MlpPolicy::new(mlp(), ActionHead::Discrete);
        assert_eq!(policy.act(&vec![1., 2.].into())?.data, vec![1.]);
        assert_eq!(policy.act(&vec![-1., -2.].into())?.data, vec![2.]);
        Ok(())
    }

    #[test]
    fn test_continuous_head() -> Result<()> {
        let policy = MlpPolicy::new(mlp(), ActionHead::Continuous { scale: 2.0 });
        assert_eq!(policy.act(&vec![1., 2.].into())?.data, vec![2., 4., -6.]);
        Ok(())
    }

    #[test]
    fn test_observation_of_wrong_size() {
        let policy = MlpPolicy::new(mlp(), ActionHead::Discrete);
        assert!(policy.act(&vec![1., 2., 3.].into()).is_err());
        assert!(policy.act(&Mat::new(vec![1., 2.], vec![1, 2])).is_err());
    }

    #[test]
    fn test_samples_are_in_range() {
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..100 {
            let a = ActionHead::Discrete.sample(3, &mut rng);
            assert!(a.data[0] >= 0. && a.data[0] < 3.);
            let a = ActionHead::Continuous { scale: 2.0 }.sample(3, &mut rng);
            assert!(a.data.iter().all(|x| x.abs() <= 2.0));
        }
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("mlp_policy")?;
        let path = dir.path().join("mlp.bincode");
        let policy = MlpPolicy::new(mlp(), ActionHead::Continuous { scale: 0.5 });
        policy.save(&path)?;

        let policy_ = MlpPolicy::from_serialized_path(&path)?;
        assert_eq!(policy.mlp(), policy_.mlp());
        assert_eq!(policy.head(), policy_.head());
        Ok(())
    }
}
