use crate::util::{InDim, OutDim};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `units` - Widths of the hidden layers. If empty, the MLP is a single linear layer.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
        }
    }

    /// Widths of the hidden layers.
    pub fn units(&self) -> &[usize] {
        &self.units
    }
}

impl Default for MlpConfig {
    /// A single hidden layer of 100 units.
    fn default() -> Self {
        Self::new(0, vec![100], 0)
    }
}

impl InDim for MlpConfig {
    fn get_in_dim(&self) -> usize {
        self.in_dim
    }

    fn set_in_dim(&mut self, in_dim: usize) {
        self.in_dim = in_dim;
    }
}

impl OutDim for MlpConfig {
    fn get_out_dim(&self) -> usize {
        self.out_dim
    }

    fn set_out_dim(&mut self, out_dim: usize) {
        self.out_dim = out_dim;
    }
}
