//! Conversion of observation histories into agent states.
//!
//! [`TraceGenerator`](crate::TraceGenerator) hands the full history of raw
//! observations of the current rollout to a [`StateProcessor`] before every
//! action. At the first step of a rollout the history is empty.

/// Turns the history of raw observations into the state vector fed to the agent.
pub trait StateProcessor<O> {
    /// Processes the observations seen so far in the current rollout, oldest first.
    fn process(&mut self, history: &[O]) -> Vec<f32>;
}

impl<O, F> StateProcessor<O> for F
where
    F: FnMut(&[O]) -> Vec<f32>,
{
    fn process(&mut self, history: &[O]) -> Vec<f32> {
        self(history)
    }
}

/// Uses the latest observation as the state, zeros before the first step.
#[derive(Clone, Debug)]
pub struct LastObs {
    obs_dim: usize,
}

impl LastObs {
    /// Constructs the processor for observations of length `obs_dim`.
    pub fn new(obs_dim: usize) -> Self {
        Self { obs_dim }
    }
}

impl<O: AsRef<[f32]>> StateProcessor<O> for LastObs {
    fn process(&mut self, history: &[O]) -> Vec<f32> {
        match history.last() {
            Some(obs) => obs.as_ref().to_vec(),
            None => vec![0f32; self.obs_dim],
        }
    }
}

/// Concatenates the latest `n_stack` observations, oldest first.
///
/// Missing frames at the beginning of a rollout are filled with zeros, so the
/// output always has `n_stack * obs_dim` elements.
#[derive(Clone, Debug)]
pub struct FrameStack {
    n_stack: usize,
    obs_dim: usize,
}

impl FrameStack {
    /// Constructs the processor.
    pub fn new(n_stack: usize, obs_dim: usize) -> Self {
        Self { n_stack, obs_dim }
    }

    /// Length of the processed state.
    pub fn state_dim(&self) -> usize {
        self.n_stack * self.obs_dim
    }
}

impl<O: AsRef<[f32]>> StateProcessor<O> for FrameStack {
    fn process(&mut self, history: &[O]) -> Vec<f32> {
        let n_frames = history.len().min(self.n_stack);
        let n_pad = self.n_stack - n_frames;
        let mut state = vec![0f32; n_pad * self.obs_dim];
        state.reserve(n_frames * self.obs_dim);

        for obs in &history[history.len() - n_frames..] {
            state.extend_from_slice(obs.as_ref());
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_obs() {
        let mut p = LastObs::new(2);
        let history: Vec<Vec<f32>> = vec![];
        assert_eq!(p.process(&history), vec![0.0, 0.0]);

        let history = vec![vec![1f32, 2.0], vec![3.0, 4.0]];
        assert_eq!(p.process(&history), vec![3.0, 4.0]);
    }

    #[test]
    fn test_frame_stack() {
        let mut p = FrameStack::new(3, 2);
        assert_eq!(p.state_dim(), 6);

        let history = vec![vec![1f32, 2.0]];
        assert_eq!(p.process(&history), vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0]);

        let history = vec![vec![1f32, 1.0], vec![2.0, 2.0], vec![3.0, 3.0], vec![4.0, 4.0]];
        assert_eq!(p.process(&history), vec![2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn test_closure() {
        let mut p = |h: &[Vec<f32>]| vec![h.len() as f32];
        let history = vec![vec![0f32], vec![0f32]];
        assert_eq!(p.process(&history), vec![2.0]);
    }
}
