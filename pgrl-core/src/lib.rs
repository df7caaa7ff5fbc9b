#![warn(missing_docs)]
//! Core components of policy-gradient reinforcement learning.
//!
//! # Traces
//!
//! A [`Trace`] is the ordered list of `(state, action, reward)` steps of one
//! rollout, and a [`TraceBatch`] is a list of traces collected under the same
//! policy parameters. The [`discount`] module turns a batch into training rows,
//! weighting each step by the discounted return that followed it within its
//! own trace.
//!
//! # Collecting traces
//!
//! [`TraceGenerator`] drives an [`Env`] with a [`Policy`]. Environments emit
//! raw observations; a [`StateProcessor`] turns the history of observations of
//! the current rollout into the state vector given to the policy. The policy
//! returns an action index, which the generator maps to the concrete action of
//! the environment.
//!
//! # Training
//!
//! [`Agent`] extends [`Policy`] with a policy-gradient update, a supervised
//! (behavior cloning) update and persistence of its parameters. [`Trainer`]
//! alternates trace collection and policy-gradient updates and reports
//! [`Record`](record::Record)s to a recorder.
pub mod discount;
pub mod error;
pub mod processor;
pub mod record;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, Info, Obs, Policy, Step, Trace, TraceBatch, TraceStep,
};

mod generator;
pub use generator::{GeneratorConfig, TraceGenerator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};

pub use discount::{
    discount_returns, flatten_batch_for_pg, flatten_batch_for_supervised, FlatBatch,
    DISCOUNT_FACTOR,
};
pub use error::PgrlError;
pub use processor::{FrameStack, LastObs, StateProcessor};
