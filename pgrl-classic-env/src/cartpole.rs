//! Cart-pole balancing.
mod base;
mod config;
pub use base::{CartPoleEnv, CartPoleState};
pub use config::CartPoleConfig;
