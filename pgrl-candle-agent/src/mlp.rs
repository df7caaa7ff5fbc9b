//! Multilayer perceptron.
mod base;
mod config;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::MlpConfig;

/// Applies the layers with ReLU in between; the last layer is linear.
fn mlp_forward(xs: Tensor, layers: &[Linear]) -> candle_core::Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for (i, layer) in layers.iter().enumerate() {
        xs = layer.forward(&xs)?;
        if i + 1 < n_layers {
            xs = xs.relu()?;
        }
    }

    Ok(xs)
}
