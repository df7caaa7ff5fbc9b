//! Policy-gradient reinforcement learning in Rust.
//!
//! pgrl consists of the following crates:
//!
//! * [pgrl-core](../pgrl_core/index.html) provides traces, discounting, the
//!   trace generator, state processors, the trainer and the traits tying
//!   environments and agents together.
//! * [pgrl-candle-agent](../pgrl_candle_agent/index.html) includes the REINFORCE
//!   agent based on [candle](https://crates.io/crates/candle-core).
//! * [pgrl-classic-env](../pgrl_classic_env/index.html) includes classic control
//!   environments simulated in Rust.
//! * pgrl (this crate) is a collection of examples and utilities shared by them.
pub mod util;
