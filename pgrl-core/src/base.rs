//! Core functionalities.
mod agent;
mod env;
mod policy;
mod step;
mod trace;
pub use agent::Agent;
pub use env::Env;
pub use policy::{Configurable, Policy};
use std::fmt::Debug;
pub use step::{Info, Step};
pub use trace::{Trace, TraceBatch, TraceStep};

/// Raw observation emitted by an environment.
///
/// Observations are never fed to the agent directly; a
/// [`StateProcessor`](crate::StateProcessor) turns the history of observations
/// into the state vector the agent consumes.
pub trait Obs: Clone + Debug {}

impl Obs for Vec<f32> {}

/// Concrete action of an environment.
///
/// Agents only know action indices `0..action_dim`; the
/// [`TraceGenerator`](crate::TraceGenerator) maps an index to the concrete action.
pub trait Act: Clone + Debug {}

impl Act for i64 {}

impl Act for usize {}

impl Act for Vec<f32> {}
