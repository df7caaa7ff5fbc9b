//! Utilities shared by the examples.
use anyhow::Result;
use log::info;
use pgrl_core::{error::PgrlError, Env, Policy, StateProcessor, TraceGenerator};

/// Hand-written cart-pole controller pushing the cart toward the side the pole leans to.
///
/// It works on the state `[x, x_dot, theta, theta_dot]` and keeps the pole up
/// for long episodes, so its traces can be used as demonstrations.
#[derive(Clone, Debug, Default)]
pub struct CartPoleHeuristic;

impl Policy for CartPoleHeuristic {
    fn act(&mut self, state: &[f32]) -> Result<usize> {
        let (theta, theta_dot) = match state {
            [_, _, theta, theta_dot] => (*theta, *theta_dot),
            _ => {
                return Err(PgrlError::DimensionMismatch {
                    expected: 4,
                    actual: state.len(),
                }
                .into())
            }
        };
        match theta + 0.5 * theta_dot > 0.0 {
            true => Ok(1),
            false => Ok(0),
        }
    }
}

/// Runs `n_traces` rollouts with the configuration of the generator and
/// returns the mean of the total rewards.
pub fn evaluate<E, P, S>(
    generator: &mut TraceGenerator<E>,
    agent: &mut P,
    state_processor: &mut S,
    n_traces: usize,
) -> Result<f32>
where
    E: Env,
    P: Policy + ?Sized,
    S: StateProcessor<E::Obs> + ?Sized,
{
    let batch = generator.generate_batch(agent, state_processor, n_traces)?;
    let mean_return = batch.mean_total_reward();
    info!(
        "Evaluated {} traces: mean return = {}, mean length = {}",
        n_traces,
        mean_return,
        batch.mean_len()
    );
    Ok(mean_return)
}
