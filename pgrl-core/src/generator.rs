//! Collection of traces by running a policy in an environment.
mod config;
use crate::{error::PgrlError, Env, Policy, StateProcessor, Trace, TraceBatch, TraceStep};
use anyhow::Result;
pub use config::GeneratorConfig;
use log::{debug, trace};

/// Drives an environment with a [`Policy`] and records [`Trace`]s.
///
/// The agent only deals with action indices. The generator owns the mapping
/// `env_actions[ix]` from an index to the concrete action of the environment.
///
/// Rollouts are strictly sequential; nothing is retried. Any fault of the
/// environment aborts the trace being collected and is returned as
/// [`PgrlError::Environment`].
pub struct TraceGenerator<E: Env> {
    env: E,
    env_actions: Vec<E::Act>,
    config: GeneratorConfig,
}

impl<E: Env> TraceGenerator<E> {
    /// Constructs a generator with the default [`GeneratorConfig`].
    pub fn new(env: E, env_actions: Vec<E::Act>) -> Self {
        Self::with_config(env, env_actions, GeneratorConfig::default())
    }

    /// Constructs a generator.
    pub fn with_config(env: E, env_actions: Vec<E::Act>, config: GeneratorConfig) -> Self {
        Self {
            env,
            env_actions,
            config,
        }
    }

    /// Number of action indices the generator can map to concrete actions.
    pub fn action_dim(&self) -> usize {
        self.env_actions.len()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns the environment as mutable.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Consumes the generator and returns the environment.
    pub fn into_env(self) -> E {
        self.env
    }

    /// Resets the environment, then puts it into `start_state`.
    pub fn set_start_state(&mut self, start_state: &E::FullState) -> Result<()> {
        self.env.reset().map_err(PgrlError::environment)?;
        self.env
            .restore_full_state(start_state)
            .map_err(PgrlError::environment)?;
        Ok(())
    }

    /// Runs a single rollout and returns its trace.
    ///
    /// The environment is reset and, if `start_state` is given, restored to it
    /// afterwards. Then at most `horizon` steps are taken:
    ///
    /// 1. the processor computes the state from the observations returned so
    ///    far in this rollout (empty at the first step),
    /// 2. the agent picks an action index,
    /// 3. the environment steps with the corresponding concrete action,
    /// 4. the environment is rendered if `render` is `true`,
    /// 5. `(state, action index, reward)` is appended to the trace.
    ///
    /// The rollout stops early when the environment reports the end of the episode.
    pub fn generate_trace<P, S>(
        &mut self,
        agent: &mut P,
        state_processor: &mut S,
        start_state: Option<&E::FullState>,
        horizon: usize,
        render: bool,
    ) -> Result<Trace>
    where
        P: Policy + ?Sized,
        S: StateProcessor<E::Obs> + ?Sized,
    {
        self.env.reset().map_err(PgrlError::environment)?;
        if let Some(start_state) = start_state {
            self.env
                .restore_full_state(start_state)
                .map_err(PgrlError::environment)?;
        }

        let mut trace = Trace::new();
        let mut past_obs = Vec::new();

        for t in 0..horizon {
            let state = state_processor.process(&past_obs);
            let ix = agent.act(&state)?;
            let act = self.env_actions.get(ix).ok_or(PgrlError::InvalidAction {
                action: ix,
                action_dim: self.env_actions.len(),
            })?;
            let step = self.env.step(act).map_err(PgrlError::environment)?;
            if render {
                self.env.render().map_err(PgrlError::environment)?;
            }
            trace!("t = {}, action = {}, reward = {}", t, ix, step.reward);

            let is_done = step.is_done();
            trace.push(TraceStep::new(state, ix, step.reward));
            past_obs.push(step.obs);

            if is_done {
                break;
            }
        }

        debug!(
            "Generated trace: length = {}, return = {}",
            trace.len(),
            trace.total_reward()
        );
        Ok(trace)
    }

    /// Runs a single rollout with the horizon and render flag of the configuration.
    pub fn rollout<P, S>(
        &mut self,
        agent: &mut P,
        state_processor: &mut S,
        start_state: Option<&E::FullState>,
    ) -> Result<Trace>
    where
        P: Policy + ?Sized,
        S: StateProcessor<E::Obs> + ?Sized,
    {
        let (horizon, render) = (self.config.horizon, self.config.render);
        self.generate_trace(agent, state_processor, start_state, horizon, render)
    }

    /// Collects `n_traces` traces one after another under the current policy.
    pub fn generate_batch<P, S>(
        &mut self,
        agent: &mut P,
        state_processor: &mut S,
        n_traces: usize,
    ) -> Result<TraceBatch>
    where
        P: Policy + ?Sized,
        S: StateProcessor<E::Obs> + ?Sized,
    {
        (0..n_traces)
            .map(|_| self.rollout(agent, state_processor, None))
            .collect()
    }
}
