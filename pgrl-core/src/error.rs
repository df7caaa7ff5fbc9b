//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
///
/// Fallible functions of the workspace return [`anyhow::Result`]; the variants
/// below can be recovered with `err.downcast_ref::<PgrlError>()`.
#[derive(Error, Debug)]
pub enum PgrlError {
    /// Reward normalization was requested on a batch whose rewards have zero
    /// standard deviation.
    #[error("degenerate batch: standard deviation of {n_samples} rewards is zero (mean = {mean})")]
    DegenerateBatch {
        /// Number of rewards in the batch.
        n_samples: usize,
        /// Mean of the rewards.
        mean: f32,
    },

    /// A fault surfaced by the environment during reset, step, render or restore.
    #[error("environment error: {0}")]
    Environment(#[source] anyhow::Error),

    /// Saving or restoring model parameters failed.
    #[error("persistence error at {path:?}: {reason}")]
    Persistence {
        /// File or directory involved.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An action index outside `[0, action_dim)`.
    #[error("invalid action index {action}, action_dim = {action_dim}")]
    InvalidAction {
        /// The offending index.
        action: usize,
        /// Number of discrete actions.
        action_dim: usize,
    },

    /// State vectors of inconsistent length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl PgrlError {
    /// Wraps a failure of the environment collaborator.
    pub fn environment(err: anyhow::Error) -> Self {
        Self::Environment(err)
    }

    /// Builds a [`PgrlError::Persistence`] error.
    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
