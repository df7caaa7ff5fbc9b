//! Environment.
use super::{Act, Info, Obs, Step};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// The [`TraceGenerator`](crate::TraceGenerator) depends on exactly
/// [`Env::reset`], [`Env::step`], [`Env::render`] and [`Env::restore_full_state`].
/// Errors returned from these methods abort the rollout in progress.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Complete internal state, sufficient to put the environment back into
    /// an exact configuration.
    type FullState: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Renders the current state. No return contract beyond reporting faults.
    fn render(&mut self) -> Result<()> {
        Ok(())
    }

    /// Overwrites the internal state with `state`.
    fn restore_full_state(&mut self, state: &Self::FullState) -> Result<()>;

    /// Takes a snapshot of the internal state.
    fn full_state(&self) -> Self::FullState;
}
