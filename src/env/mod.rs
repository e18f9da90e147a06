//! The agent-environment contract
//!
//! Environments follow the classic `reset`/`step` interface. Termination is
//! signalled by `step` returning `None` as the next state, so an episode
//! always runs until the environment says it is over.

use std::collections::btree_map::{BTreeMap, Entry};

/// A simulation environment an agent can interact with
pub trait Environment {
    /// The state (observation) type produced by the environment
    type State: Clone;
    /// The action type accepted by the environment
    type Action: Clone;

    /// Reset the environment and return the initial state
    fn reset(&mut self) -> Self::State;

    /// Advance the simulation by one step
    ///
    /// Returns `(next_state, reward)`. A `None` next state means the episode
    /// has terminated and the environment must be `reset` before stepping
    /// again.
    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32);

    /// Render the current state, if the environment supports it
    fn render(&mut self) {}

    /// Draw a state uniformly from the observation space
    ///
    /// Mirrors gym's `observation_space.sample()` and is used to calibrate
    /// state featurizers; it does not affect the simulation.
    fn random_state(&self) -> Self::State;
}

/// An environment whose actions are real-valued vectors with box bounds
pub trait ContinuousActionSpace: Environment {
    /// Number of action dimensions
    fn action_dim(&self) -> usize;

    /// Per-dimension `(low, high)` action bounds
    ///
    /// Actions passed to [`Environment::step`] must lie inside these bounds;
    /// enforcing that is the caller's job.
    fn action_bounds(&self) -> (Vec<f32>, Vec<f32>);

    /// Build the environment's action type from a raw action vector
    ///
    /// The vector always has `action_dim` entries.
    fn action_from_vec(action: Vec<f32>) -> Self::Action;
}

/// A keyed accumulator for per-episode metrics
///
/// Environments own a `Report` and add to it as they step; callers read it
/// out between episodes.
///
/// ```
/// use ppo_rl::env::Report;
///
/// let mut report = Report::new(vec!["reward"]);
/// report.entry("reward").and_modify(|x| *x += 1.5);
/// assert_eq!(report.get("reward"), Some(1.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Report {
    metrics: BTreeMap<&'static str, f64>,
}

impl Report {
    /// Create a report with the given keys, all initialized to zero
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self {
            metrics: keys.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    /// Entry API for updating a metric in place
    pub fn entry(&mut self, key: &'static str) -> Entry<'_, &'static str, f64> {
        self.metrics.entry(key)
    }

    /// Read a metric, if it exists
    pub fn get(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    /// Zero every metric, keeping the keys
    pub fn clear(&mut self) {
        for value in self.metrics.values_mut() {
            *value = 0.0;
        }
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.metrics.iter().map(|(&k, &v)| (k, v))
    }
}
