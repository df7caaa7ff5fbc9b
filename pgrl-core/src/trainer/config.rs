//! Configuration of [`Trainer`](super::Trainer).
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of rollout-update iterations.
    pub max_iters: usize,

    /// The number of traces collected per iteration, forming one batch.
    pub traces_per_iter: usize,

    /// Interval of flushing records in iterations.
    pub flush_record_interval: usize,

    /// Interval of saving model parameters in iterations.
    pub save_interval: usize,

    /// Directory where model parameters will be saved.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_iters: 0,
            traces_per_iter: 1,
            flush_record_interval: usize::MAX,
            save_interval: usize::MAX,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of iterations.
    pub fn max_iters(mut self, v: usize) -> Self {
        self.max_iters = v;
        self
    }

    /// Sets the number of traces per iteration.
    pub fn traces_per_iter(mut self, v: usize) -> Self {
        self.traces_per_iter = v;
        self
    }

    /// Sets the interval of flushing records in iterations.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Sets the interval of saving in iterations.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the directory the trained model being saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Fails if an interval is zero.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.flush_record_interval > 0,
            "flush_record_interval must be positive"
        );
        ensure!(self.save_interval > 0, "save_interval must be positive");
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b: Self = serde_yaml::from_reader(rdr)?;
        b.validate()?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
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
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .max_iters(100)
            .traces_per_iter(8)
            .save_interval(10)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");

        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_zero_interval_is_rejected() -> Result<()> {
        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");

        TrainerConfig::default().save_interval(0).save(&path)?;
        assert!(TrainerConfig::load(&path).is_err());

        TrainerConfig::default()
            .flush_record_interval(0)
            .save(&path)?;
        assert!(TrainerConfig::load(&path).is_err());
        Ok(())
    }
}
