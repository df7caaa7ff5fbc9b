//! Discounted returns and flattening of trace batches into training rows.
//!
//! A [`TraceBatch`] is turned into a pair of row-major matrices, `states` and
//! `targets`, one row per step. For the policy-gradient update each target row
//! is the discounted return of the step placed at the index of the action taken
//! (zero elsewhere), so that the loss only needs `-(log(p) * targets)` summed
//! over actions and averaged over rows. For behavior cloning the target rows
//! are plain one-hot vectors.
use crate::{error::PgrlError, Trace, TraceBatch};
use anyhow::Result;
use log::trace;

/// Decay factor of rewards per step of delay.
pub const DISCOUNT_FACTOR: f32 = 0.98;

/// Returns `g_t = r_t + DISCOUNT_FACTOR * g_t+1` for every step of the trace.
pub fn discount_returns(trace: &Trace) -> Vec<f32> {
    discount_returns_with(trace, DISCOUNT_FACTOR)
}

/// Returns `g_t = r_t + gamma * g_t+1` for every step of the trace.
///
/// Computed in a single backward pass; `g_L = 0`.
pub fn discount_returns_with(trace: &Trace, gamma: f32) -> Vec<f32> {
    discount(&trace.rewards(), gamma)
}

fn discount(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0f32; rewards.len()];
    let mut running = 0f32;

    for (t, r) in rewards.iter().enumerate().rev() {
        running = running * gamma + r;
        returns[t] = running;
    }

    returns
}

/// Standardizes `values` in place with their mean and population standard deviation.
///
/// Fails with [`PgrlError::DegenerateBatch`] if the standard deviation is zero.
/// `values` is left untouched in that case.
pub fn normalize(values: &mut [f32]) -> Result<(), PgrlError> {
    let n = values.len();
    let mean = match n {
        0 => 0.0,
        _ => values.iter().sum::<f32>() / n as f32,
    };
    let var = match n {
        0 => 0.0,
        _ => values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n as f32,
    };
    let std = var.sqrt();

    if std == 0.0 || !std.is_finite() {
        return Err(PgrlError::DegenerateBatch { n_samples: n, mean });
    }

    values.iter_mut().for_each(|v| *v = (*v - mean) / std);
    Ok(())
}

/// Training rows built from a [`TraceBatch`].
#[derive(Clone, Debug, PartialEq)]
pub struct FlatBatch {
    /// Row-major `n_rows x state_dim` matrix of states.
    pub states: Vec<f32>,

    /// Row-major `n_rows x action_dim` matrix of targets.
    pub targets: Vec<f32>,

    /// Number of rows.
    pub n_rows: usize,

    /// Length of a state vector.
    pub state_dim: usize,

    /// Number of discrete actions.
    pub action_dim: usize,
}

impl FlatBatch {
    /// Returns the `i`-th state row.
    pub fn state(&self, i: usize) -> &[f32] {
        &self.states[i * self.state_dim..(i + 1) * self.state_dim]
    }

    /// Returns the `i`-th target row.
    pub fn target(&self, i: usize) -> &[f32] {
        &self.targets[i * self.action_dim..(i + 1) * self.action_dim]
    }
}

/// Builds rows with target `weight * one_hot(action)`, one weight per step.
///
/// Returns `Ok(None)` if the batch holds no steps.
fn flatten(
    batch: &TraceBatch,
    action_dim: usize,
    weights: &[f32],
) -> Result<Option<FlatBatch>, PgrlError> {
    let n_rows = batch.total_steps();
    if n_rows == 0 {
        return Ok(None);
    }
    debug_assert_eq!(weights.len(), n_rows);

    let state_dim = batch
        .iter()
        .flat_map(Trace::iter)
        .next()
        .map(|step| step.state.len())
        .unwrap_or_default();
    let mut states = Vec::with_capacity(n_rows * state_dim);
    let mut targets = vec![0f32; n_rows * action_dim];

    for (i, (step, w)) in batch
        .iter()
        .flat_map(Trace::iter)
        .zip(weights.iter())
        .enumerate()
    {
        if step.action >= action_dim {
            return Err(PgrlError::InvalidAction {
                action: step.action,
                action_dim,
            });
        }
        if step.state.len() != state_dim {
            return Err(PgrlError::DimensionMismatch {
                expected: state_dim,
                actual: step.state.len(),
            });
        }
        states.extend_from_slice(&step.state);
        targets[i * action_dim + step.action] = *w;
    }

    trace!(
        "Flatten {} traces into {} rows (state_dim = {}, action_dim = {})",
        batch.len(),
        n_rows,
        state_dim,
        action_dim
    );

    Ok(Some(FlatBatch {
        states,
        targets,
        n_rows,
        state_dim,
        action_dim,
    }))
}

/// Flattens a batch for the policy-gradient update.
///
/// If `normalize_rewards` is `true`, the raw rewards of the whole batch are
/// standardized first. The (standardized) rewards are then discounted per
/// trace, never across traces, and placed into the one-hot rows.
///
/// Returns `Ok(None)` if the batch holds no steps; the caller must skip the update.
pub fn flatten_batch_for_pg(
    batch: &TraceBatch,
    action_dim: usize,
    normalize_rewards: bool,
) -> Result<Option<FlatBatch>, PgrlError> {
    if batch.total_steps() == 0 {
        return Ok(None);
    }

    let mut rewards = batch
        .iter()
        .flat_map(Trace::iter)
        .map(|step| step.reward)
        .collect::<Vec<_>>();

    if normalize_rewards {
        normalize(&mut rewards)?;
    }

    let mut returns = Vec::with_capacity(rewards.len());
    let mut offset = 0;
    for trace in batch.iter() {
        let rs = &rewards[offset..offset + trace.len()];
        returns.extend(discount(rs, DISCOUNT_FACTOR));
        offset += trace.len();
    }

    flatten(batch, action_dim, &returns)
}

/// Flattens a batch for behavior cloning: targets are one-hot actions.
///
/// Returns `Ok(None)` if the batch holds no steps; the caller must skip the update.
pub fn flatten_batch_for_supervised(
    batch: &TraceBatch,
    action_dim: usize,
) -> Result<Option<FlatBatch>, PgrlError> {
    let weights = vec![1f32; batch.total_steps()];
    flatten(batch, action_dim, &weights)
}
