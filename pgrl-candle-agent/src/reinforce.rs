//! REINFORCE agent.
//!
//! The agent keeps a stochastic policy over discrete actions, parameterized
//! by a [`SubModel1`](crate::model::SubModel1) that outputs logits. It is
//! trained either with the policy gradient, weighting the log-probability of
//! each action taken by the discounted return that followed it, or with
//! behavior cloning on recorded actions.
mod base;
mod config;
mod model;
pub use base::Reinforce;
pub use config::ReinforceConfig;
pub use model::{ReinforceModel, ReinforceModelConfig, PARAMS_FILE_NAME};
