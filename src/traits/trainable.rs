//! The trainable-agent surface
//!
//! An agent interacts with an environment in one of two modes: *learn*, where
//! collected episodes periodically trigger gradient updates, and *evaluate*,
//! where the policy is only measured. Both return the per-episode total
//! rewards so callers can track learning curves.

use anyhow::Result;

use crate::env::Environment;

/// Metrics averaged over one training pass
#[derive(Clone, Debug, Default)]
pub struct TrainingMetrics {
    /// Mean policy (actor) loss over all minibatch updates
    pub policy_loss: f32,
    /// Mean value (critic) loss over all minibatch updates
    pub value_loss: f32,
    /// Mean policy entropy, a rough exploration gauge
    pub entropy: f32,
    /// Number of minibatch gradient updates performed
    pub n_updates: usize,
}

/// An agent that can be trained on and evaluated against an environment
pub trait TrainableAgent<E: Environment> {
    /// Run `n_episodes` episodes with training active
    ///
    /// Returns the total reward of each episode, in order. Fails if a
    /// training pass is attempted with no collected data, which indicates a
    /// caller error rather than a recoverable condition.
    fn learn(&mut self, env: &mut E, n_episodes: usize) -> Result<Vec<f32>>;

    /// Run `n_episodes` episodes without collecting data or training
    fn evaluate(&mut self, env: &mut E, n_episodes: usize) -> Vec<f32>;

    /// Total number of environment steps taken so far
    fn total_steps(&self) -> usize;
}
