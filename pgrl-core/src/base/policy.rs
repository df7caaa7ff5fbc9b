//! Policy.
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A stochastic policy over discrete action indices.
///
/// This is the only contract [`TraceGenerator`](crate::TraceGenerator) needs
/// from an agent. `state` is a single processed state; batching is not supported.
pub trait Policy {
    /// Returns an action index in `[0, action_dim)`.
    fn act(&mut self, state: &[f32]) -> Result<usize>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn act(&mut self, state: &[f32]) -> Result<usize> {
        (**self).act(state)
    }
}

/// A configurable object.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Build the object with the configuration in the yaml file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Self::build(config)
    }
}
