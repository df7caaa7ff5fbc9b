//! Agent.
use super::{Policy, TraceBatch};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy.
///
/// Both training methods must be no-ops returning an empty [`Record`] when the
/// batch holds no steps at all.
pub trait Agent: Policy {
    /// Performs one policy-gradient (REINFORCE) step on the batch.
    ///
    /// Every step is weighted by the discounted return that followed it
    /// within its own trace.
    fn learn_policy_gradient(&mut self, batch: &TraceBatch) -> Result<Record>;

    /// Performs one behavior cloning step, treating the actions of the batch
    /// as labels and ignoring rewards.
    fn learn_supervised(&mut self, batch: &TraceBatch) -> Result<Record>;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    ///
    /// On failure, the parameters are left unchanged.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
