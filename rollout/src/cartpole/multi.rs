use super::{base::Cart, CartPoleAct, CartPoleConfig, CartPoleObs};
use anyhow::{bail, Result};
use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use rollout_core::{record::Record, AgentId, AgentMap, Dones, MultiAgentEnv, MultiAgentStep};
use std::io::{self, Write};

/// Configuration of [`MultiCartPole`].
#[derive(Clone, Debug)]
pub struct MultiCartPoleConfig {
    /// Configuration of each cart.
    pub cart: CartPoleConfig,

    /// The number of carts.
    pub n_carts: usize,
}

impl MultiCartPoleConfig {
    pub fn new(cart: CartPoleConfig, n_carts: usize) -> Self {
        Self { cart, n_carts }
    }
}

/// Independent carts, one agent each.
///
/// Agents are named `cart0`, `cart1`, ... A cart that is done has no observation
/// and no reward until the next reset; its action is ignored. The episode is over
/// when every cart is done.
pub struct MultiCartPole {
    config: CartPoleConfig,
    seed: u64,
    rng: StdRng,
    carts: Vec<(AgentId, Cart)>,
}

impl MultiCartPole {
    fn is_done(&self, cart: &Cart) -> bool {
        cart.terminated || cart.ticks >= self.config.max_steps
    }

    fn observe(&self) -> AgentMap<Option<CartPoleObs>> {
        self.carts
            .iter()
            .map(|(id, cart)| (id.clone(), (!self.is_done(cart)).then(|| cart.obs())))
            .collect()
    }
}

impl MultiAgentEnv for MultiCartPole {
    type Config = MultiCartPoleConfig;
    type Obs = CartPoleObs;
    type Act = CartPoleAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.n_carts == 0 {
            bail!("MultiCartPole needs at least one cart");
        }
        let seed = seed as u64;
        let carts = (0..config.n_carts)
            .map(|i| (AgentId::new(format!("cart{}", i)), Cart::default()))
            .collect();

        Ok(Self {
            config: config.cart.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            carts,
        })
    }

    fn reset(&mut self) -> Result<AgentMap<Option<Self::Obs>>> {
        for (_, cart) in self.carts.iter_mut() {
            cart.reset(self.config.init_range, &mut self.rng);
        }
        Ok(self.observe())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<AgentMap<Option<Self::Obs>>> {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        self.reset()
    }

    fn step(&mut self, acts: &AgentMap<Self::Act>) -> Result<(MultiAgentStep<Self>, Record)> {
        let mut reward = AgentMap::new();
        let max_steps = self.config.max_steps;

        for (id, cart) in self.carts.iter_mut() {
            if cart.terminated || cart.ticks >= max_steps {
                continue;
            }
            let act = match acts.get(id) {
                Some(act) => act,
                None => bail!("No action for {}", id),
            };
            cart.step(act);
            reward.insert(id.clone(), 1.0);
            if cart.terminated || cart.ticks >= max_steps {
                debug!("{} is done after {} steps", id, cart.ticks);
            }
        }

        let agents: AgentMap<bool> = self
            .carts
            .iter()
            .map(|(id, cart)| (id.clone(), self.is_done(cart)))
            .collect();
        let all = agents.values().all(|d| *d);
        let step = MultiAgentStep {
            obs: self.observe(),
            reward,
            dones: Dones { agents, all },
            info: (),
        };
        Ok((step, Record::empty()))
    }

    fn render(&mut self) -> Result<()> {
        let mut out = io::stdout().lock();
        for (id, cart) in self.carts.iter() {
            writeln!(out, "{:>6} {}", id, cart.render(self.config.render_width))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_finished_cart_has_no_observation() -> Result<()> {
        let config = MultiCartPoleConfig::new(CartPoleConfig::default().max_steps(50), 2);
        let mut env = MultiCartPole::build(&config, 0)?;
        let obs = env.reset()?;
        assert_eq!(obs.len(), 2);
        assert!(obs.values().all(|o| o.is_some()));

        // cart0 is pushed one way until it falls, cart1 is balanced.
        let (cart0, cart1) = (AgentId::from("cart0"), AgentId::from("cart1"));
        let balance = |obs: &Option<CartPoleObs>| match obs {
            Some(CartPoleObs([_, _, theta, theta_dot])) => {
                CartPoleAct((theta + theta_dot > 0.0) as _)
            }
            None => CartPoleAct(0),
        };
        let mut obs1 = obs[&cart1].clone();
        let mut t = 0;
        loop {
            let acts = AgentMap::from([
                (cart0.clone(), CartPoleAct(1)),
                (cart1.clone(), balance(&obs1)),
            ]);
            let (step, _) = env.step(&acts)?;
            t += 1;
            if step.dones.is_done(&cart0) {
                assert!(step.obs[&cart0].is_none());
                assert!(step.obs[&cart1].is_some());
                assert!(!step.dones.all);
                break;
            }
            obs1 = step.obs[&cart1].clone();
        }

        // Only cart1 acts from now on.
        let acts = AgentMap::from([(cart1.clone(), CartPoleAct(0))]);
        let (step, _) = env.step(&acts)?;
        assert!(!step.reward.contains_key(&cart0));
        assert!(t < 50);
        Ok(())
    }

    #[test]
    fn test_all_done_at_truncation() -> Result<()> {
        let config = MultiCartPoleConfig::new(CartPoleConfig::default().max_steps(2), 3);
        let mut env = MultiCartPole::build(&config, 0)?;
        let obs = env.reset()?;
        let acts: AgentMap<_> = obs.keys().map(|id| (id.clone(), CartPoleAct(0))).collect();

        let (step, _) = env.step(&acts)?;
        assert!(!step.dones.all);
        let (step, _) = env.step(&acts)?;
        assert!(step.dones.all);
        assert!(step.obs.values().all(|o| o.is_none()));
        Ok(())
    }
}
