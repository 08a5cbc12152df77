use super::{base::Cart, CartPoleAct, CartPoleConfig, CartPoleObs};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, SeedableRng};
use rollout_core::{record::Record, Env, Step};
use std::io::{self, Write};

/// Classic cart-pole balancing task.
///
/// The reward is `1.0` for every step until the pole falls or the cart leaves the
/// track. The episode is truncated after [`CartPoleConfig::max_steps`] steps. Steps
/// after the end of the episode leave the state unchanged and give no reward.
pub struct CartPole {
    config: CartPoleConfig,
    seed: u64,
    rng: StdRng,
    cart: Cart,
}

impl CartPole {
    fn is_done(&self) -> bool {
        self.cart.terminated || self.cart.ticks >= self.config.max_steps
    }
}

impl Env for CartPole {
    type Config = CartPoleConfig;
    type Obs = CartPoleObs;
    type Act = CartPoleAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let seed = seed as u64;
        Ok(Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            cart: Cart::default(),
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        let reward = match self.is_done() {
            true => 0.0,
            false => {
                self.cart.step(a);
                1.0
            }
        };
        let obs = self.cart.obs();
        trace!("{:?}", obs);

        let is_truncated = !self.cart.terminated && self.cart.ticks >= self.config.max_steps;
        let step = Step::new(obs, a.clone(), reward, self.cart.terminated, is_truncated, ());
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.cart.reset(self.config.init_range, &mut self.rng);
        Ok(self.cart.obs())
    }

    /// Resets with the random generator seeded by `seed + ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        self.reset()
    }

    fn render(&mut self) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.cart.render(self.config.render_width))?;
        Ok(())
    }
}
