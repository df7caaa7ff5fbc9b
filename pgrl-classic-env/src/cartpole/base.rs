use super::CartPoleConfig;
use anyhow::{bail, Result};
use log::info;
use pgrl_core::{Env, Step};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Width of the track drawn by [`Env::render`].
const TRACK_WIDTH: usize = 41;

/// Full internal state of [`CartPoleEnv`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CartPoleState {
    /// Position of the cart.
    pub x: f64,

    /// Velocity of the cart.
    pub x_dot: f64,

    /// Angle of the pole.
    pub theta: f64,

    /// Angular velocity of the pole.
    pub theta_dot: f64,

    /// Number of steps since the last reset.
    pub steps: usize,
}

/// Cart-pole balancing, simulated with explicit Euler integration.
///
/// The observation is `[x, x_dot, theta, theta_dot]`. Action `1` pushes the
/// cart to the right and action `0` pushes it to the left. Every step yields
/// a reward of `1.0`. The episode terminates when the cart leaves the track
/// or the pole falls beyond the threshold angle, and is truncated after
/// `max_steps` steps.
pub struct CartPoleEnv {
    config: CartPoleConfig,
    state: CartPoleState,
    rng: SmallRng,
}

impl CartPoleEnv {
    /// Action indices of the environment, to be mapped from agent outputs.
    pub fn actions() -> Vec<i64> {
        vec![0, 1]
    }

    /// Length of the observation.
    pub fn obs_dim() -> usize {
        4
    }

    fn obs(&self) -> Vec<f32> {
        vec![
            self.state.x as f32,
            self.state.x_dot as f32,
            self.state.theta as f32,
            self.state.theta_dot as f32,
        ]
    }

    fn is_terminated(&self) -> bool {
        self.state.x.abs() > self.config.x_threshold
            || self.state.theta.abs() > self.config.theta_threshold
    }
}

impl Env for CartPoleEnv {
    type Config = CartPoleConfig;
    type Obs = Vec<f32>;
    type Act = i64;
    type Info = ();
    type FullState = CartPoleState;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            state: CartPoleState::default(),
            rng: SmallRng::seed_from_u64(seed as u64),
        })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.state = CartPoleState {
            x: self.rng.gen_range(-0.05..0.05),
            x_dot: self.rng.gen_range(-0.05..0.05),
            theta: self.rng.gen_range(-0.05..0.05),
            theta_dot: self.rng.gen_range(-0.05..0.05),
            steps: 0,
        };
        Ok(self.obs())
    }

    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>> {
        let c = &self.config;
        let force = match *a {
            0 => -c.force_mag,
            1 => c.force_mag,
            _ => bail!("invalid action {} for cart-pole", a),
        };

        let s = &mut self.state;
        let (sin_theta, cos_theta) = s.theta.sin_cos();
        let total_mass = c.mass_cart + c.mass_pole;
        let pole_mass_length = c.mass_pole * c.length;

        let temp = (force + pole_mass_length * s.theta_dot.powi(2) * sin_theta) / total_mass;
        let theta_acc = (c.gravity * sin_theta - cos_theta * temp)
            / (c.length * (4.0 / 3.0 - c.mass_pole * cos_theta.powi(2) / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        s.x += c.tau * s.x_dot;
        s.x_dot += c.tau * x_acc;
        s.theta += c.tau * s.theta_dot;
        s.theta_dot += c.tau * theta_acc;
        s.steps += 1;

        let is_terminated = self.is_terminated();
        let is_truncated = !is_terminated && self.state.steps >= self.config.max_steps;

        Ok(Step::new(self.obs(), 1.0, is_terminated, is_truncated, ()))
    }

    /// Logs the cart and the pole as a line of text.
    fn render(&mut self) -> Result<()> {
        let x_threshold = self.config.x_threshold;
        let pos =
            (self.state.x.clamp(-x_threshold, x_threshold) + x_threshold) / (2.0 * x_threshold);
        let ix = (pos * (TRACK_WIDTH - 1) as f64).round() as usize;
        let pole = match self.state.theta {
            t if t > 0.05 => '/',
            t if t < -0.05 => '\\',
            _ => '|',
        };
        let track = (0..TRACK_WIDTH)
            .map(|i| if i == ix { pole } else { '-' })
            .collect::<String>();
        info!(
            "[{}] step = {}, x = {:.3}, theta = {:.3}",
            track, self.state.steps, self.state.x, self.state.theta
        );
        Ok(())
    }

    fn restore_full_state(&mut self, state: &Self::FullState) -> Result<()> {
        self.state = state.clone();
        Ok(())
    }

    fn full_state(&self) -> Self::FullState {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> CartPoleEnv {
        CartPoleEnv::build(&CartPoleConfig::default(), 0).unwrap()
    }

    #[test]
    fn test_reset_is_near_upright() -> Result<()> {
        let mut env = env();
        let obs = env.reset()?;
        assert_eq!(obs.len(), CartPoleEnv::obs_dim());
        assert!(obs.iter().all(|v| v.abs() <= 0.05));
        assert_eq!(env.full_state().steps, 0);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_episode() -> Result<()> {
        let (mut env1, mut env2) = (env(), env());
        assert_eq!(env1.reset()?, env2.reset()?);
        for a in [0, 1, 1, 0, 1] {
            assert_eq!(env1.step(&a)?.obs, env2.step(&a)?.obs);
        }
        Ok(())
    }

    #[test]
    fn test_pole_falls_under_constant_push() -> Result<()> {
        let mut env = env();
        env.reset()?;
        let mut n_steps = 0;
        loop {
            let step = env.step(&1)?;
            n_steps += 1;
            assert_eq!(step.reward, 1.0);
            if step.is_done() {
                assert!(step.is_terminated);
                break;
            }
        }
        assert!(n_steps < 100);
        Ok(())
    }

    #[test]
    fn test_truncation() -> Result<()> {
        let mut env = CartPoleEnv::build(&CartPoleConfig::default().max_steps(3), 0)?;
        env.restore_full_state(&CartPoleState::default())?;
        let flags = [0, 1, 0]
            .iter()
            .map(|a| env.step(a).map(|s| (s.is_terminated, s.is_truncated)))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(flags, vec![(false, false), (false, false), (false, true)]);
        Ok(())
    }

    #[test]
    fn test_restore_full_state() -> Result<()> {
        let mut env = env();
        env.reset()?;
        env.step(&1)?;
        let snapshot = env.full_state();
        let next = env.step(&0)?.obs;

        env.reset()?;
        env.restore_full_state(&snapshot)?;
        assert_eq!(env.full_state(), snapshot);
        assert_eq!(env.step(&0)?.obs, next);
        assert_eq!(env.full_state().steps, 2);
        Ok(())
    }

    #[test]
    fn test_invalid_action() {
        let mut env = env();
        env.reset().unwrap();
        assert!(env.step(&2).is_err());
    }

    #[test]
    fn test_render() -> Result<()> {
        let mut env = env();
        env.reset()?;
        env.render()
    }
}
