//! Traces of agent-environment interaction.
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// A `(state, action, reward)` triple recorded at one time step.
///
/// `state` is the processed state fed to the agent, not the raw observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Processed state.
    pub state: Vec<f32>,

    /// Index of the action taken.
    pub action: usize,

    /// Reward returned by the environment for the action.
    pub reward: f32,
}

impl TraceStep {
    /// Constructs a [`TraceStep`].
    pub fn new(state: Vec<f32>, action: usize, reward: f32) -> Self {
        Self {
            state,
            action,
            reward,
        }
    }
}

/// One episode, from reset to termination or horizon, in temporal order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    steps: Vec<TraceStep>,
}

impl Trace {
    /// Constructs an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn push(&mut self, step: TraceStep) {
        self.steps.push(step);
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the trace has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the steps.
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Returns an iterator over the steps.
    pub fn iter(&self) -> std::slice::Iter<'_, TraceStep> {
        self.steps.iter()
    }

    /// Rewards in temporal order.
    pub fn rewards(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.reward).collect()
    }

    /// Actions in temporal order.
    pub fn actions(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.action).collect()
    }

    /// Undiscounted sum of rewards.
    pub fn total_reward(&self) -> f32 {
        self.steps.iter().map(|s| s.reward).sum()
    }
}

impl From<Vec<TraceStep>> for Trace {
    fn from(steps: Vec<TraceStep>) -> Self {
        Self { steps }
    }
}

impl FromIterator<TraceStep> for Trace {
    fn from_iter<I: IntoIterator<Item = TraceStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceStep;
    type IntoIter = std::slice::Iter<'a, TraceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Traces collected under a single policy snapshot, used as one training unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceBatch {
    traces: Vec<Trace>,
}

impl TraceBatch {
    /// Constructs an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trace.
    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    /// Number of traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Returns `true` if the batch has no traces.
    ///
    /// Note that a batch of empty traces is not empty by this definition;
    /// use [`TraceBatch::total_steps`] to check if there is anything to train on.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Total number of steps over all traces.
    pub fn total_steps(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }

    /// Returns the traces.
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Returns an iterator over the traces.
    pub fn iter(&self) -> std::slice::Iter<'_, Trace> {
        self.traces.iter()
    }

    /// Average of undiscounted returns over traces, `0` for an empty batch.
    pub fn mean_total_reward(&self) -> f32 {
        match self.traces.is_empty() {
            true => 0.0,
            false => {
                self.traces.iter().map(Trace::total_reward).sum::<f32>() / self.traces.len() as f32
            }
        }
    }

    /// Average trace length, `0` for an empty batch.
    pub fn mean_len(&self) -> f32 {
        match self.traces.is_empty() {
            true => 0.0,
            false => self.total_steps() as f32 / self.traces.len() as f32,
        }
    }

    /// Loads a batch from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let batch: Self = serde_json::from_reader(BufReader::new(file))?;
        info!("Load {} traces from {:?}", batch.len(), path);
        Ok(batch)
    }

    /// Saves the batch as a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut wtr = BufWriter::new(file);
        serde_json::to_writer(&mut wtr, self)?;
        wtr.flush()?;
        info!("Save {} traces into {:?}", self.len(), path);
        Ok(())
    }
}

impl From<Vec<Trace>> for TraceBatch {
    fn from(traces: Vec<Trace>) -> Self {
        Self { traces }
    }
}

impl FromIterator<Trace> for TraceBatch {
    fn from_iter<I: IntoIterator<Item = Trace>>(iter: I) -> Self {
        Self {
            traces: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TraceBatch {
    type Item = &'a Trace;
    type IntoIter = std::slice::Iter<'a, Trace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn trace(rewards: &[f32]) -> Trace {
        rewards
            .iter()
            .enumerate()
            .map(|(i, &r)| TraceStep::new(vec![i as f32], i % 2, r))
            .collect()
    }

    #[test]
    fn test_batch_statistics() {
        let batch: TraceBatch = vec![trace(&[1.0, 1.0, 1.0]), trace(&[2.0]), Trace::new()].into();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.total_steps(), 4);
        assert!((batch.mean_total_reward() - 5.0 / 3.0).abs() < 1e-6);
        assert!((batch.mean_len() - 4.0 / 3.0).abs() < 1e-6);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_empty_batch_statistics() {
        let batch = TraceBatch::new();
        assert_eq!(batch.total_steps(), 0);
        assert_eq!(batch.mean_total_reward(), 0.0);
        assert_eq!(batch.mean_len(), 0.0);
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let dir = TempDir::new("trace_batch")?;
        let path = dir.path().join("traces.json");
        let batch: TraceBatch = vec![trace(&[0.5, -1.0]), trace(&[3.0])].into();

        batch.save(&path)?;
        let batch_ = TraceBatch::load(&path)?;
        assert_eq!(batch, batch_);
        Ok(())
    }
}
