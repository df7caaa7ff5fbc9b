//! REINFORCE agent implemented with candle.
use super::{ReinforceConfig, ReinforceModel, PARAMS_FILE_NAME};
use crate::{
    model::SubModel1,
    util::{InDim, OutDim},
    Device,
};
use anyhow::Result;
use candle_core::{shape::D, Tensor};
use candle_nn::ops::softmax;
use log::{debug, trace};
use pgrl_core::{
    discount::{flatten_batch_for_pg, flatten_batch_for_supervised, FlatBatch},
    error::PgrlError,
    record::{Record, RecordValue},
    Agent, Configurable, Policy, TraceBatch,
};
use rand::{distributions::WeightedIndex, rngs::SmallRng, Rng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};

/// Floor added to every action probability so that the log is finite.
const PROB_FLOOR: f64 = 1e-8;

/// REINFORCE agent implemented with candle.
///
/// `P` is the type parameter of the policy network, which maps a batch of
/// states to the logits of the action distribution.
///
/// # Action selection
///
/// [`Policy::act`] draws an action index from `softmax(logits) + 1e-8`. Then,
/// with probability `exploration_rate`, the drawn index is discarded and a
/// uniformly random index is returned instead. Both draws are made on every
/// call.
///
/// # Training
///
/// [`Agent::learn_policy_gradient`] minimizes
/// `-mean_rows(sum_actions(log(p) * targets))`, where each target row is the
/// discounted return of the step at the index of the action taken.
/// [`Agent::learn_supervised`] minimizes the same loss with one-hot targets,
/// which is the cross-entropy against the recorded actions.
pub struct Reinforce<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    policy_model: ReinforceModel<P>,
    state_dim: usize,
    action_dim: usize,
    exploration_rate: f64,
    normalize_rewards: bool,
    device: candle_core::Device,
    rng: SmallRng,
    record_verbose_level: usize,
}

impl<P> Reinforce<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Length of the state vector.
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// Number of discrete actions.
    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    /// Probability of replacing the sampled action with a uniform one.
    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    /// Sets the exploration rate.
    pub fn set_exploration_rate(&mut self, v: f64) {
        self.exploration_rate = v;
    }

    /// Returns the policy network.
    pub fn policy_model(&self) -> &ReinforceModel<P> {
        &self.policy_model
    }

    /// Returns the action distribution `softmax(logits) + 1e-8` for a single state.
    pub fn action_probs(&self, state: &[f32]) -> Result<Vec<f32>> {
        if state.len() != self.state_dim {
            return Err(PgrlError::DimensionMismatch {
                expected: self.state_dim,
                actual: state.len(),
            }
            .into());
        }
        let xs = Tensor::from_slice(state, (1, self.state_dim), &self.device)?;
        let probs = self.probs(&xs)?.squeeze(0)?.to_vec1::<f32>()?;
        Ok(probs)
    }

    fn probs(&self, states: &Tensor) -> Result<Tensor> {
        let logits = self.policy_model.forward(states)?;
        Ok((softmax(&logits, D::Minus1)? + PROB_FLOOR)?)
    }

    fn learn(&mut self, batch: Option<FlatBatch>) -> Result<Record> {
        let batch = match batch {
            Some(batch) => batch,
            None => {
                debug!("Skip the update on an empty batch");
                return Ok(Record::empty());
            }
        };
        if batch.state_dim != self.state_dim {
            return Err(PgrlError::DimensionMismatch {
                expected: self.state_dim,
                actual: batch.state_dim,
            }
            .into());
        }

        let n_rows = batch.n_rows;
        let states = Tensor::from_vec(batch.states, (n_rows, self.state_dim), &self.device)?;
        let targets = Tensor::from_vec(batch.targets, (n_rows, self.action_dim), &self.device)?;
        let log_probs = self.probs(&states)?.log()?;
        let loss = (&log_probs * &targets)?
            .sum(D::Minus1)?
            .mean_all()?
            .neg()?;
        self.policy_model.backward_step(&loss)?;

        let loss = loss.to_scalar::<f32>()?;
        trace!("loss = {}, n_samples = {}", loss, n_rows);

        let record = Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("n_samples", RecordValue::Scalar(n_rows as f32)),
        ]);

        match self.record_verbose_level >= 2 {
            true => Ok(record.merge(self.policy_model.param_stats()?)),
            false => Ok(record),
        }
    }
}

impl<P> Policy for Reinforce<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn act(&mut self, state: &[f32]) -> Result<usize> {
        let probs = self.action_probs(state)?;
        let ix = self.rng.sample(WeightedIndex::new(&probs)?);

        match self.rng.gen::<f64>() < self.exploration_rate {
            true => Ok(self.rng.gen_range(0..self.action_dim)),
            false => Ok(ix),
        }
    }
}

impl<P> Configurable for Reinforce<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    type Config = ReinforceConfig<P>;

    /// Constructs REINFORCE agent.
    fn build(config: Self::Config) -> Result<Self> {
        let device: candle_core::Device = config.device.unwrap_or(Device::Cpu).try_into()?;
        let policy_model = ReinforceModel::build(config.model_config, device.clone())?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Ok(Self {
            state_dim: policy_model.in_dim(),
            action_dim: policy_model.out_dim(),
            policy_model,
            exploration_rate: config.exploration_rate,
            normalize_rewards: config.normalize_rewards,
            device,
            rng,
            record_verbose_level: config.record_verbose_level,
        })
    }
}

impl<P> Agent for Reinforce<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn learn_policy_gradient(&mut self, batch: &TraceBatch) -> Result<Record> {
        let batch = flatten_batch_for_pg(batch, self.action_dim, self.normalize_rewards)?;
        self.learn(batch)
    }

    fn learn_supervised(&mut self, batch: &TraceBatch) -> Result<Record> {
        let batch = flatten_batch_for_supervised(batch, self.action_dim)?;
        self.learn(batch)
    }

    /// Save model parameters in the given directory.
    ///
    /// The parameters of the policy network are saved as `policy_model.safetensors`.
    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| PgrlError::persistence(path, e))?;
        self.policy_model.save(path.join(PARAMS_FILE_NAME))
    }

    /// Load model parameters in the given directory.
    ///
    /// The parameters of the policy network are loaded from `policy_model.safetensors`.
    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.policy_model.load(path.join(PARAMS_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mlp::{Mlp, MlpConfig},
        util::flat_params,
    };
    use pgrl_core::{Trace, TraceStep};
    use tempdir::TempDir;

    const STATE_DIM: usize = 4;
    const ACTION_DIM: usize = 3;

    fn config(units: Vec<usize>) -> ReinforceConfig<Mlp> {
        ReinforceConfig::default()
            .policy_model_config(MlpConfig::new(STATE_DIM, units, ACTION_DIM))
            .seed(42)
    }

    fn agent() -> Result<Reinforce<Mlp>> {
        Reinforce::build(config(vec![100]))
    }

    fn states() -> Vec<Vec<f32>> {
        vec![
            vec![0.1, -0.2, 0.3, 0.0],
            vec![1.0, 0.5, -0.5, 2.0],
            vec![-1.0, 0.0, 0.0, 0.7],
        ]
    }

    fn all_probs(agent: &Reinforce<Mlp>) -> Result<Vec<Vec<f32>>> {
        states().iter().map(|s| agent.action_probs(s)).collect()
    }

    fn batch(rewards: &[f32]) -> TraceBatch {
        let trace: Trace = rewards
            .iter()
            .enumerate()
            .map(|(i, &r)| TraceStep::new(vec![i as f32; STATE_DIM], i % ACTION_DIM, r))
            .collect();
        vec![trace].into()
    }

    #[test]
    fn test_action_probs() -> Result<()> {
        let agent = agent()?;
        for probs in all_probs(&agent)? {
            assert_eq!(probs.len(), ACTION_DIM);
            assert!(probs.iter().all(|&p| p > 0.0));
            assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_action_probs_dimension_mismatch() -> Result<()> {
        let agent = agent()?;
        let err = agent.action_probs(&[0.0; STATE_DIM + 1]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PgrlError>(),
            Some(PgrlError::DimensionMismatch {
                expected: STATE_DIM,
                actual: 5
            })
        ));
        Ok(())
    }

    #[test]
    fn test_act_in_range() -> Result<()> {
        let mut agent = agent()?;
        for state in states() {
            for _ in 0..20 {
                assert!(agent.act(&state)? < ACTION_DIM);
            }
        }
        Ok(())
    }

    #[test]
    fn test_uniform_actions_when_fully_exploring() -> Result<()> {
        let mut agent = Reinforce::build(config(vec![100]).exploration_rate(1.0))?;
        let n = 3000;
        let mut counts = [0usize; ACTION_DIM];
        for _ in 0..n {
            counts[agent.act(&states()[1])?] += 1;
        }

        // Chi-square with 2 degrees of freedom; 13.8 is the 0.999 quantile.
        let expected = n as f32 / ACTION_DIM as f32;
        let chi2 = counts
            .iter()
            .map(|&c| (c as f32 - expected).powi(2) / expected)
            .sum::<f32>();
        assert!(chi2 < 13.8, "counts = {:?}", counts);
        Ok(())
    }

    #[test]
    fn test_empty_batch_is_noop() -> Result<()> {
        let mut agent = agent()?;
        let before = all_probs(&agent)?;

        let empty: TraceBatch = vec![Trace::new()].into();
        assert!(agent.learn_policy_gradient(&empty)?.is_empty());
        assert!(agent.learn_supervised(&TraceBatch::new())?.is_empty());

        assert_eq!(before, all_probs(&agent)?);
        Ok(())
    }

    #[test]
    fn test_policy_gradient_changes_params() -> Result<()> {
        let mut agent = agent()?;
        let before = flat_params(agent.policy_model().get_varmap())?;

        let record = agent.learn_policy_gradient(&batch(&[1.0]))?;
        assert!(record.get_scalar("loss")?.is_finite());
        assert_eq!(record.get_scalar("n_samples")?, 1.0);

        let after = flat_params(agent.policy_model().get_varmap())?;
        assert!(before.iter().zip(after.iter()).any(|(x, y)| x != y));
        Ok(())
    }

    #[test]
    fn test_policy_gradient_raises_rewarded_action() -> Result<()> {
        let mut agent = Reinforce::build(
            config(vec![16]).opt_config(crate::opt::OptimizerConfig::Sgd { lr: 0.1 }),
        )?;
        let state = vec![0.0; STATE_DIM];
        let before = agent.action_probs(&state)?[0];

        // The action at index 0 is followed by a positive return.
        let batch = batch(&[1.0]);
        for _ in 0..10 {
            agent.learn_policy_gradient(&batch)?;
        }
        assert!(agent.action_probs(&state)?[0] > before);
        Ok(())
    }

    #[test]
    fn test_supervised_fits_labels() -> Result<()> {
        let mut agent = Reinforce::build(config(vec![16]).opt_config(
            crate::opt::OptimizerConfig::Adam { lr: 0.01 },
        ))?;
        let batch = batch(&[0.0, 0.0, 0.0]);
        let first = agent.learn_supervised(&batch)?.get_scalar("loss")?;
        let mut last = first;
        for _ in 0..200 {
            last = agent.learn_supervised(&batch)?.get_scalar("loss")?;
        }
        assert!(last < first);
        Ok(())
    }

    #[test]
    fn test_degenerate_batch() -> Result<()> {
        let mut agent = Reinforce::build(config(vec![100]).normalize_rewards(true))?;
        let before = flat_params(agent.policy_model().get_varmap())?;
        let err = agent
            .learn_policy_gradient(&batch(&[1.0, 1.0, 1.0, 1.0]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PgrlError>(),
            Some(PgrlError::DegenerateBatch { n_samples: 4, .. })
        ));
        assert_eq!(before, flat_params(agent.policy_model().get_varmap())?);

        agent.learn_policy_gradient(&batch(&[1.0, 0.0, 1.0, 0.0]))?;
        Ok(())
    }

    #[test]
    fn test_param_stats_in_record() -> Result<()> {
        let mut agent = Reinforce::build(config(vec![100]).record_verbose_level(2))?;
        let record = agent.learn_policy_gradient(&batch(&[1.0, 2.0]))?;
        assert!(record.get_scalar("mlp.ln0.weight_mean").is_ok());
        assert!(record.get_scalar("mlp.ln1.bias_std").is_ok());
        Ok(())
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let dir = TempDir::new("reinforce")?;
        let mut src = agent()?;
        src.learn_policy_gradient(&batch(&[1.0, -1.0, 0.5]))?;
        src.save_params(dir.path())?;
        assert!(dir.path().join(PARAMS_FILE_NAME).is_file());

        let mut dest = agent()?;
        dest.load_params(dir.path())?;
        assert_eq!(all_probs(&src)?, all_probs(&dest)?);
        Ok(())
    }

    #[test]
    fn test_load_mismatched_params() -> Result<()> {
        let dir = TempDir::new("reinforce")?;
        Reinforce::build(config(vec![32]))?.save_params(dir.path())?;

        let mut dest = agent()?;
        let before = all_probs(&dest)?;
        let err = dest.load_params(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PgrlError>(),
            Some(PgrlError::Persistence { .. })
        ));
        assert_eq!(before, all_probs(&dest)?);
        Ok(())
    }
}
