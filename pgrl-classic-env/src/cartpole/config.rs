//! Configuration of [`CartPoleEnv`](super::CartPoleEnv).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`CartPoleEnv`](super::CartPoleEnv).
///
/// The default values are the standard cart-pole parameters.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CartPoleConfig {
    /// Gravitational acceleration.
    pub gravity: f64,

    /// Mass of the cart.
    pub mass_cart: f64,

    /// Mass of the pole.
    pub mass_pole: f64,

    /// Half the length of the pole.
    pub length: f64,

    /// Magnitude of the force applied to the cart.
    pub force_mag: f64,

    /// Seconds between state updates.
    pub tau: f64,

    /// The episode terminates when the cart leaves `[-x_threshold, x_threshold]`.
    pub x_threshold: f64,

    /// The episode terminates when the angle of the pole exceeds this value in radians.
    pub theta_threshold: f64,

    /// The episode is truncated after this number of steps.
    pub max_steps: usize,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length: 0.5,
            force_mag: 10.0,
            tau: 0.02,
            x_threshold: 2.4,
            theta_threshold: 12.0 * 2.0 * std::f64::consts::PI / 360.0,
            max_steps: 500,
        }
    }
}

impl CartPoleConfig {
    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Constructs [`CartPoleConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CartPoleConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
