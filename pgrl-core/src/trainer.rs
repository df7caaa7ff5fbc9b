//! Train [`Agent`] with the on-policy rollout-update cycle.
mod config;
use crate::{
    error::PgrlError,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    Agent, Env, StateProcessor, TraceGenerator,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
use std::path::Path;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop.
///
/// # Training loop
///
/// For `iter` in `1..=max_iters`:
///
/// 1. Collect `traces_per_iter` traces with the [`TraceGenerator`] under the
///    current parameters of the agent.
/// 2. Update the agent with [`Agent::learn_policy_gradient`] on the batch.
///    If reward normalization rejects the batch as degenerate, the batch is
///    discarded with a warning.
/// 3. Store the returned record, along with `mean_return` and `mean_length`
///    of the batch, in the recorder.
/// 4. If `iter % flush_record_interval == 0`, flush the recorder.
/// 5. If the mean return is the best so far, save the parameters in
///    `(model_dir)/best`.
/// 6. If `iter % save_interval == 0`, save the parameters in `(model_dir)/(iter)`.
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action index|G[TraceGenerator]
///     G-->|Env::Act|E[Env]
///     E-->|Env::Obs|P[StateProcessor]
///     P-->|state|A
///     G-->|TraceBatch|A
/// ```
pub struct Trainer {
    config: TrainerConfig,
    best_mean_return: f32,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            config,
            best_mean_return: f32::MIN,
        }
    }

    /// Best mean return of a batch seen so far.
    pub fn best_mean_return(&self) -> f32 {
        self.best_mean_return
    }

    fn save_model<A: Agent + ?Sized>(&self, agent: &A, sub_dir: &str) -> Result<()> {
        if let Some(model_dir) = &self.config.model_dir {
            let path = Path::new(model_dir).join(sub_dir);
            agent.save_params(&path)?;
            info!("Saved the model in {:?}", &path);
        }
        Ok(())
    }

    /// Train the agent.
    ///
    /// Fails before collecting anything if an interval of the configuration is zero.
    pub fn train<E, A, S, R>(
        &mut self,
        generator: &mut TraceGenerator<E>,
        state_processor: &mut S,
        agent: &mut A,
        recorder: &mut R,
    ) -> Result<()>
    where
        E: Env,
        A: Agent + ?Sized,
        S: StateProcessor<E::Obs> + ?Sized,
        R: AggregateRecorder + ?Sized,
    {
        self.config.validate()?;
        let n_traces = self.config.traces_per_iter;

        for iter in 1..=self.config.max_iters {
            let batch = generator.generate_batch(agent, state_processor, n_traces)?;
            let mean_return = batch.mean_total_reward();

            let mut record = match agent.learn_policy_gradient(&batch) {
                Ok(record) => record,
                Err(err) => match err.downcast_ref::<PgrlError>() {
                    Some(PgrlError::DegenerateBatch { .. }) => {
                        warn!("Discarded batch at iteration {}: {}", iter, err);
                        Record::empty()
                    }
                    _ => return Err(err),
                },
            };
            record.insert("iter", Scalar(iter as f32));
            record.insert("mean_return", Scalar(mean_return));
            record.insert("mean_length", Scalar(batch.mean_len()));
            recorder.store(record);

            if iter % self.config.flush_record_interval == 0 {
                recorder.flush(iter as i64);
            }

            if mean_return > self.best_mean_return {
                self.best_mean_return = mean_return;
                self.save_model(agent, "best")?;
            }

            if iter % self.config.save_interval == 0 {
                self.save_model(agent, &iter.to_string())?;
            }
        }

        recorder.flush(self.config.max_iters as i64);
        Ok(())
    }
}
