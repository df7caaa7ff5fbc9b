//! Configuration of [`TraceGenerator`](super::TraceGenerator).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`TraceGenerator`](super::TraceGenerator).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GeneratorConfig {
    /// The maximum number of environment steps in a trace.
    pub horizon: usize,

    /// If `true`, the environment is rendered after every step.
    pub render: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            horizon: 200,
            render: false,
        }
    }
}

impl GeneratorConfig {
    /// Sets the maximum number of steps in a trace.
    pub fn horizon(mut self, v: usize) -> Self {
        self.horizon = v;
        self
    }

    /// Sets if the environment is rendered.
    pub fn render(mut self, v: bool) -> Self {
        self.render = v;
        self
    }

    /// Constructs [`GeneratorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GeneratorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_generator_config() -> Result<()> {
        let config = GeneratorConfig::default().horizon(50).render(true);
        let dir = TempDir::new("generator_config")?;
        let path = dir.path().join("generator_config.yaml");

        config.save(&path)?;
        let config_ = GeneratorConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
