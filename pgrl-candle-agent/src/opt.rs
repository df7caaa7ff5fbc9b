//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW, SGD};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training neural networks in an agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Decay rate of the second moment.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Term added to the denominator.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// Stochastic gradient descent.
    Sgd {
        /// Learning rate.
        lr: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// Constructs an optimizer over the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars, params)?;
                Ok(Optimizer::AdamW(opt))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
            OptimizerConfig::Sgd { lr } => {
                let opt = SGD::new(vars, *lr)?;
                Ok(Optimizer::Sgd(opt))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
            Self::Sgd { lr: _ } => Self::Sgd { lr },
        }
    }
}

impl Default for OptimizerConfig {
    /// Adam with learning rate 0.001.
    fn default() -> Self {
        Self::Adam { lr: 0.001 }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of [`candle_nn::Optimizer`] implementations.
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW),

    /// Adam optimizer.
    Adam(Adam),

    /// Stochastic gradient descent.
    Sgd(SGD),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
            Self::Sgd(opt) => Ok(opt.backward_step(loss)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_adam() {
        assert_eq!(OptimizerConfig::default(), OptimizerConfig::Adam { lr: 0.001 });
        assert_eq!(
            OptimizerConfig::default().learning_rate(0.01),
            OptimizerConfig::Adam { lr: 0.01 }
        );
    }

    #[test]
    fn test_yaml() -> Result<()> {
        let config: OptimizerConfig = serde_yaml::from_str("AdamW:\n  lr: 0.0003\n")?;
        match config {
            OptimizerConfig::AdamW { lr, beta1, .. } => {
                assert_eq!(lr, 0.0003);
                assert_eq!(beta1, ParamsAdamW::default().beta1);
            }
            _ => panic!("unexpected config: {:?}", config),
        }
        Ok(())
    }
}
