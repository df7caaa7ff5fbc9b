use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{InDim, OutDim},
};
use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use pgrl_core::{error::PgrlError, record::Record};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Name of the file holding the parameters in a model directory.
pub const PARAMS_FILE_NAME: &str = "policy_model.safetensors";

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`ReinforceModel`].
///
/// The type parameter `C` is the configuration of the policy network,
/// which outputs the logits of the action distribution.
pub struct ReinforceModelConfig<C>
where
    C: InDim + OutDim + Clone,
{
    /// Configuration of the policy network.
    pub policy_model_config: Option<C>,

    /// Configuration of the optimizer.
    #[serde(default)]
    pub opt_config: OptimizerConfig,
}

impl<C> Default for ReinforceModelConfig<C>
where
    C: DeserializeOwned + Serialize + InDim + OutDim + Clone,
{
    fn default() -> Self {
        Self {
            policy_model_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<C> ReinforceModelConfig<C>
where
    C: DeserializeOwned + Serialize + InDim + OutDim + Clone,
{
    /// Sets configurations for the policy network.
    pub fn policy_model_config(mut self, v: C) -> Self {
        self.policy_model_config = Some(v);
        self
    }

    /// Sets the input dimension of the network.
    pub fn in_dim(mut self, v: usize) -> Self {
        if let Some(config) = &mut self.policy_model_config {
            config.set_in_dim(v);
        }
        self
    }

    /// Sets the output dimension of the network.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(config) = &mut self.policy_model_config {
            config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`ReinforceModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ReinforceModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Policy network with its parameters and optimizer.
///
/// The [`VarMap`] holds the parameters exclusively. They are changed only by
/// [`ReinforceModel::backward_step`] and [`ReinforceModel::load`].
pub struct ReinforceModel<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
{
    device: Device,
    varmap: VarMap,
    in_dim: usize,
    out_dim: usize,
    policy_model: P,
    opt: Optimizer,
}

impl<P> ReinforceModel<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Clone,
{
    /// Constructs [`ReinforceModel`].
    pub fn build(config: ReinforceModelConfig<P::Config>, device: Device) -> Result<Self> {
        let policy_model_config = config
            .policy_model_config
            .context("policy_model_config is not set.")?;
        let in_dim = policy_model_config.get_in_dim();
        let out_dim = policy_model_config.get_out_dim();
        let varmap = VarMap::new();

        let policy_model = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            P::build(vb, policy_model_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            in_dim,
            out_dim,
            policy_model,
            opt,
        })
    }

    /// Returns the logits for a batch of states of shape `(n, in_dim)`.
    pub fn forward(&self, states: &Tensor) -> Result<Tensor> {
        self.policy_model.forward(states)
    }

    /// Performs one optimization step minimizing `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Input dimension of the network.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Output dimension of the network.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Device where the parameters live.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns the parameters.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Writes the parameters to a safetensors file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.varmap
            .save(path)
            .map_err(|e| PgrlError::persistence(path, e))?;
        info!("Save policy model to {:?}", path);
        Ok(())
    }

    /// Reads the parameters from a safetensors file.
    ///
    /// Every variable of the model must be found in the file with the same
    /// shape and dtype. All of them are checked before any is overwritten,
    /// so the parameters are unchanged if this method fails.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        let path = path.as_ref();
        let tensors = candle_core::safetensors::load(path, &self.device)
            .map_err(|e| PgrlError::persistence(path, e))?;
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|e| PgrlError::persistence(path, e))?;

        for (name, var) in data.iter() {
            let tensor = tensors
                .get(name)
                .ok_or_else(|| PgrlError::persistence(path, format!("missing tensor {}", name)))?;
            if tensor.shape() != var.shape() {
                return Err(PgrlError::persistence(
                    path,
                    format!(
                        "shape mismatch for {}: expected {:?}, got {:?}",
                        name,
                        var.shape(),
                        tensor.shape()
                    ),
                )
                .into());
            }
            if tensor.dtype() != var.dtype() {
                return Err(PgrlError::persistence(
                    path,
                    format!(
                        "dtype mismatch for {}: expected {:?}, got {:?}",
                        name,
                        var.dtype(),
                        tensor.dtype()
                    ),
                )
                .into());
            }
        }

        for (name, var) in data.iter() {
            let tensor = tensors
                .get(name)
                .ok_or_else(|| anyhow!("missing tensor {}", name))?;
            var.set(tensor)
                .map_err(|e| PgrlError::persistence(path, e))?;
        }

        info!("Load policy model from {:?}", path);
        Ok(())
    }

    /// Mean and standard deviation of every parameter.
    pub fn param_stats(&self) -> Result<Record> {
        crate::util::param_stats(&self.varmap)
    }
}
