//! Classic control environments implementing [`pgrl_core::Env`].
//!
//! The environments are simulated in Rust and support taking and restoring
//! snapshots of their full internal state.
mod cartpole;
pub use cartpole::{CartPoleConfig, CartPoleEnv, CartPoleState};
