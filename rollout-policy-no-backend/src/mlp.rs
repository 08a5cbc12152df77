use crate::Mat;
use anyhow::{bail, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Activation function applied to the output layer of [`Mlp`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum OutputActivation {
    Identity,
    Tanh,
}

impl Default for OutputActivation {
    fn default() -> Self {
        Self::Tanh
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
/// Multilayer perceptron with ReLU activation function.
pub struct Mlp {
    /// Weights of layers, of shape `[out, in]`.
    ws: Vec<Mat>,

    /// Biases of layers, of shape `[out, 1]`.
    bs: Vec<Mat>,

    #[serde(default)]
    activation: OutputActivation,
}

impl Mlp {
    /// Constructs an MLP, checking that the layers fit together.
    pub fn new(ws: Vec<Mat>, bs: Vec<Mat>, activation: OutputActivation) -> Result<Self> {
        let mlp = Self { ws, bs, activation };
        mlp.validate()?;
        Ok(mlp)
    }

    /// Constructs an MLP with weights drawn uniformly from `[-1/sqrt(in), 1/sqrt(in)]`.
    ///
    /// `dims` lists the input dimension followed by the output dimension of each layer.
    pub fn random(dims: &[usize], activation: OutputActivation, rng: &mut impl Rng) -> Self {
        let (ws, bs) = dims
            .windows(2)
            .map(|d| {
                let (n_in, n_out) = (d[0], d[1]);
                let r = 1.0 / (n_in.max(1) as f32).sqrt();
                let w = (0..n_in * n_out).map(|_| rng.gen_range(-r..=r)).collect();
                let b = (0..n_out).map(|_| rng.gen_range(-r..=r)).collect();
                (Mat::new(w, vec![n_out as _, n_in as _]), Mat::new(b, vec![n_out as _, 1]))
            })
            .unzip();
        Self { ws, bs, activation }
    }

    /// Checks the shapes of the layers.
    pub fn validate(&self) -> Result<()> {
        if self.ws.is_empty() || self.ws.len() != self.bs.len() {
            bail!(
                "MLP needs the same positive number of weights and biases, got {} and {}",
                self.ws.len(),
                self.bs.len()
            );
        }
        for (i, (w, b)) in self.ws.iter().zip(self.bs.iter()).enumerate() {
            if w.shape.len() != 2 || b.shape.len() != 2 || b.shape[0] != w.shape[0] || b.shape[1] != 1
            {
                bail!("Invalid shapes in layer {}: {:?}", i, (&w.shape, &b.shape));
            }
            if i > 0 && w.shape[1] != self.ws[i - 1].shape[0] {
                bail!("Layer {} does not take the output of layer {}", i, i - 1);
            }
        }
        Ok(())
    }

    /// Input dimension.
    pub fn in_dim(&self) -> usize {
        self.ws.first().map_or(0, |w| w.shape[1] as _)
    }

    /// Output dimension.
    pub fn out_dim(&self) -> usize {
        self.ws.last().map_or(0, |w| w.shape[0] as _)
    }

    /// Applies the network to a column vector `x`.
    pub fn forward(&self, x: &Mat) -> Mat {
        let n_layers = self.ws.len();
        let mut x = x.clone();
        for i in 0..n_layers {
            x = self.ws[i].matmul(&x).add(&self.bs[i]);
            if i != n_layers - 1 {
                x = x.relu();
            }
        }
        match self.activation {
            OutputActivation::Identity => x,
            OutputActivation::Tanh => x.tanh(),
        }
    }
}
