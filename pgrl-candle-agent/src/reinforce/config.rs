//! Configuration of REINFORCE agent.
use super::ReinforceModelConfig;
use crate::{
    model::SubModel1,
    opt::OptimizerConfig,
    util::{InDim, OutDim},
    Device,
};
use anyhow::Result;
use candle_core::Tensor;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};

/// Configuration of [`Reinforce`](super::Reinforce) agent.
///
/// `P` is the type parameter of the policy network.
#[derive(Deserialize, Serialize)]
pub struct ReinforceConfig<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Configuration of the policy network and its optimizer.
    pub model_config: ReinforceModelConfig<P::Config>,

    /// Probability of replacing the sampled action with a uniformly random one.
    pub exploration_rate: f64,

    /// If `true`, rewards are standardized over each batch before discounting.
    pub normalize_rewards: bool,

    /// Seed of the random number generator used for action selection.
    pub seed: Option<u64>,

    /// Device of the policy network.
    pub device: Option<Device>,

    /// With 2 or more, parameter statistics are added to training records.
    pub record_verbose_level: usize,

    #[serde(skip)]
    phantom: PhantomData<P>,
}

impl<P> Clone for ReinforceConfig<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        Self {
            model_config: self.model_config.clone(),
            exploration_rate: self.exploration_rate,
            normalize_rewards: self.normalize_rewards,
            seed: self.seed,
            device: self.device,
            record_verbose_level: self.record_verbose_level,
            phantom: PhantomData,
        }
    }
}

impl<P> PartialEq for ReinforceConfig<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.model_config == other.model_config
            && self.exploration_rate == other.exploration_rate
            && self.normalize_rewards == other.normalize_rewards
            && self.seed == other.seed
            && self.device == other.device
            && self.record_verbose_level == other.record_verbose_level
    }
}

impl<P> Default for ReinforceConfig<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            exploration_rate: 0.1,
            normalize_rewards: false,
            seed: None,
            device: None,
            record_verbose_level: 0,
            phantom: PhantomData,
        }
    }
}

impl<P> ReinforceConfig<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Sets the configuration of the policy network.
    pub fn policy_model_config(mut self, v: P::Config) -> Self {
        self.model_config = self.model_config.policy_model_config(v);
        self
    }

    /// Sets the configuration of the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.model_config = self.model_config.opt_config(v);
        self
    }

    /// Sets the dimension of the state.
    pub fn state_dim(mut self, v: usize) -> Self {
        self.model_config = self.model_config.in_dim(v);
        self
    }

    /// Sets the number of discrete actions.
    pub fn action_dim(mut self, v: usize) -> Self {
        self.model_config = self.model_config.out_dim(v);
        self
    }

    /// Sets the exploration rate.
    pub fn exploration_rate(mut self, v: f64) -> Self {
        self.exploration_rate = v;
        self
    }

    /// Enables or disables reward normalization.
    pub fn normalize_rewards(mut self, v: bool) -> Self {
        self.normalize_rewards = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// Sets device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Sets the verbosity of training records.
    pub fn record_verbose_level(mut self, v: usize) -> Self {
        self.record_verbose_level = v;
        self
    }

    /// Loads [`ReinforceConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of REINFORCE agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`ReinforceConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of REINFORCE agent into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp, MlpConfig};
    use tempdir::TempDir;

    #[test]
    fn test_serde_reinforce_config() -> Result<()> {
        let config = ReinforceConfig::<Mlp>::default()
            .policy_model_config(MlpConfig::default())
            .state_dim(4)
            .action_dim(2)
            .exploration_rate(0.2)
            .normalize_rewards(true)
            .seed(42)
            .device(Device::Cpu);
        assert_eq!(
            config.model_config.policy_model_config,
            Some(MlpConfig::new(4, vec![100], 2))
        );

        let dir = TempDir::new("reinforce_config")?;
        let path = dir.path().join("reinforce_config.yaml");
        config.save(&path)?;
        let config_ = ReinforceConfig::<Mlp>::load(&path)?;
        assert!(config == config_);
        Ok(())
    }
}
