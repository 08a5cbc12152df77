//! Dynamics shared by the cart-pole environments.
use rand::Rng;
use rollout_core::{Act, Obs};
use rollout_policy_no_backend::Mat;

const GRAVITY: f32 = 9.8;
const CART_MASS: f32 = 1.0;
const POLE_MASS: f32 = 0.1;
const POLE_HALF_LENGTH: f32 = 0.5;
const FORCE_MAG: f32 = 10.0;
const DT: f32 = 0.02;
const X_THRESHOLD: f32 = 2.4;
const THETA_THRESHOLD: f32 = 12.0 * std::f32::consts::PI / 180.0;

/// Observation of a cart, `[x, x_dot, theta, theta_dot]`.
#[derive(Clone, Debug, PartialEq)]
pub struct CartPoleObs(pub [f32; 4]);

impl Obs for CartPoleObs {}

impl From<CartPoleObs> for Mat {
    fn from(obs: CartPoleObs) -> Mat {
        obs.0.to_vec().into()
    }
}

/// Action of a cart, `0` pushes to the left and `1` to the right.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartPoleAct(pub usize);

impl Act for CartPoleAct {}

impl From<Mat> for CartPoleAct {
    /// Takes the first element as the index of the action.
    fn from(m: Mat) -> Self {
        match m.data.first() {
            Some(a) if *a >= 0.5 => Self(1),
            _ => Self(0),
        }
    }
}

/// State of a single cart.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cart {
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
    pub ticks: usize,
    pub terminated: bool,
}

impl Cart {
    pub fn reset(&mut self, init_range: f32, rng: &mut impl Rng) {
        let mut sample = || match init_range > 0.0 {
            true => rng.gen_range(-init_range..init_range),
            false => 0.0,
        };
        self.x = sample();
        self.x_dot = sample();
        self.theta = sample();
        self.theta_dot = sample();
        self.ticks = 0;
        self.terminated = false;
    }

    pub fn obs(&self) -> CartPoleObs {
        CartPoleObs([self.x, self.x_dot, self.theta, self.theta_dot])
    }

    /// Advances the dynamics by one time step with Euler integration.
    pub fn step(&mut self, act: &CartPoleAct) {
        let force = match act.0 {
            1 => FORCE_MAG,
            _ => -FORCE_MAG,
        };
        let (cos_theta, sin_theta) = (self.theta.cos(), self.theta.sin());
        let total_mass = CART_MASS + POLE_MASS;
        let pole_mass_length = POLE_MASS * POLE_HALF_LENGTH;

        let temp =
            (force + pole_mass_length * self.theta_dot * self.theta_dot * sin_theta) / total_mass;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.x += DT * self.x_dot;
        self.x_dot += DT * x_acc;
        self.theta += DT * self.theta_dot;
        self.theta_dot += DT * theta_acc;
        self.ticks += 1;
        self.terminated = self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD;
    }

    /// A line of text showing the cart on the track.
    pub fn render(&self, width: usize) -> String {
        let width = width.max(3);
        let pos = (self.x + X_THRESHOLD) / (2.0 * X_THRESHOLD) * (width - 1) as f32;
        let pos = (pos.round().max(0.0) as usize).min(width - 1);
        let pole = match self.theta {
            t if t < -THETA_THRESHOLD / 3.0 => '\\',
            t if t > THETA_THRESHOLD / 3.0 => '/',
            _ => '|',
        };
        let track: String = (0..width)
            .map(|i| if i == pos { pole } else { '_' })
            .collect();
        format!(
            "[{}] x={:+.3} theta={:+.3} t={}",
            track, self.x, self.theta, self.ticks
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_pole_falls_when_pushed_one_way() {
        let mut cart = Cart::default();
        cart.reset(0.0, &mut StdRng::seed_from_u64(0));
        let mut n = 0;
        while !cart.terminated && n < 1000 {
            cart.step(&CartPoleAct(1));
            n += 1;
        }
        assert!(cart.terminated);
        assert!(n < 100);
        // pushing right tilts the pole to the left
        assert!(cart.obs().0[2] < 0.0);
    }

    #[test]
    fn test_reset_is_within_range() {
        let mut cart = Cart::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            cart.reset(0.05, &mut rng);
            assert!(cart.obs().0.iter().all(|v| v.abs() <= 0.05));
        }
    }

    #[test]
    fn test_act_from_mat() {
        assert_eq!(CartPoleAct::from(Mat::from(vec![1.0])), CartPoleAct(1));
        assert_eq!(CartPoleAct::from(Mat::from(vec![0.0])), CartPoleAct(0));
        assert_eq!(CartPoleAct::from(Mat::from(vec![])), CartPoleAct(0));
    }

    #[test]
    fn test_render() {
        let cart = Cart::default();
        let line = cart.render(5);
        assert!(line.starts_with("[__|__]"));
    }
}
