//! RBF state featurization
//!
//! Raw low-dimensional states (pendulum angles, car positions) are often a
//! poor input space for small networks. This module lifts them through a bank
//! of random Fourier features approximating RBF kernels at several
//! bandwidths, after standardizing each dimension. [`FeaturizedEnv`] wraps an
//! environment so the agent only ever sees the feature vectors.
//!
//! Calibration draws states from [`Environment::random_state`], the
//! observation-space sampling hook.

use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::env::{ContinuousActionSpace, Environment};

/// Kernel bandwidths of the feature bank, one RBF sampler per entry
const KERNEL_GAMMAS: [f32; 4] = [5.0, 2.0, 1.0, 0.5];

/// Random Fourier components per kernel
const COMPONENTS_PER_KERNEL: usize = 100;

/// Per-dimension standardization to zero mean and unit variance
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl StandardScaler {
    /// Fit mean and standard deviation on a batch of samples
    ///
    /// Panics if `samples` is empty or ragged.
    pub fn fit(samples: &[Vec<f32>]) -> Self {
        let n = samples.len() as f32;
        let dim = samples.first().expect("scaler needs at least one sample").len();

        let mut mean = vec![0.0; dim];
        for sample in samples {
            for (m, &x) in mean.iter_mut().zip(sample) {
                *m += x / n;
            }
        }

        let mut var = vec![0.0; dim];
        for sample in samples {
            for ((v, &x), &m) in var.iter_mut().zip(sample).zip(&mean) {
                *v += (x - m).powi(2) / n;
            }
        }
        // Constant dimensions pass through unscaled
        let std = var.into_iter().map(|v| v.sqrt().max(1e-8)).collect();

        Self { mean, std }
    }

    pub fn transform(&self, x: &[f32]) -> Vec<f32> {
        x.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&x, (&m, &s))| (x - m) / s)
            .collect()
    }
}

/// Random Fourier features for one RBF kernel `k(x, y) = exp(-γ‖x - y‖²)`
///
/// Frequencies are drawn from `N(0, √(2γ))` and offsets uniformly from
/// `[0, 2π)`; each feature is `√(2/n)·cos(wᵢ·x + bᵢ)`.
#[derive(Debug, Clone)]
pub struct RbfSampler {
    weights: Vec<Vec<f32>>,
    offsets: Vec<f32>,
}

impl RbfSampler {
    pub fn fit(gamma: f32, n_components: usize, dim: usize, rng: &mut impl Rng) -> Self {
        let frequency = Normal::new(0.0, (2.0 * gamma).sqrt() as f64)
            .expect("gamma must be positive and finite");

        let weights = (0..n_components)
            .map(|_| (0..dim).map(|_| frequency.sample(rng) as f32).collect())
            .collect();
        let offsets = (0..n_components).map(|_| rng.gen_range(0.0..TAU)).collect();

        Self { weights, offsets }
    }

    pub fn transform(&self, x: &[f32]) -> Vec<f32> {
        let amplitude = (2.0 / self.weights.len() as f32).sqrt();
        self.weights
            .iter()
            .zip(&self.offsets)
            .map(|(w, &b)| {
                let projection: f32 = w.iter().zip(x).map(|(&wi, &xi)| wi * xi).sum();
                amplitude * (projection + b).cos()
            })
            .collect()
    }
}

/// Scaler plus a bank of RBF samplers at several bandwidths
#[derive(Debug, Clone)]
pub struct RbfFeaturizer {
    scaler: StandardScaler,
    samplers: Vec<RbfSampler>,
}

impl RbfFeaturizer {
    /// Calibrate on `n_samples` states drawn from the environment's
    /// observation space
    pub fn fit<E>(env: &E, n_samples: usize) -> Self
    where
        E: Environment,
        E::State: AsRef<[f32]>,
    {
        let samples: Vec<Vec<f32>> = (0..n_samples)
            .map(|_| env.random_state().as_ref().to_vec())
            .collect();
        Self::fit_samples(&samples, &mut StdRng::from_entropy())
    }

    /// Calibrate on a pre-drawn batch with a caller-supplied RNG
    pub fn fit_samples(samples: &[Vec<f32>], rng: &mut impl Rng) -> Self {
        let scaler = StandardScaler::fit(samples);
        let dim = samples[0].len();
        let samplers = KERNEL_GAMMAS
            .iter()
            .map(|&gamma| RbfSampler::fit(gamma, COMPONENTS_PER_KERNEL, dim, rng))
            .collect();

        Self { scaler, samplers }
    }

    /// Number of output features
    pub fn output_dim(&self) -> usize {
        self.samplers.len() * COMPONENTS_PER_KERNEL
    }

    /// Standardize and featurize one state
    pub fn transform(&self, state: &[f32]) -> Vec<f32> {
        let scaled = self.scaler.transform(state);
        let mut features = Vec::with_capacity(self.output_dim());
        for sampler in &self.samplers {
            features.extend(sampler.transform(&scaled));
        }
        features
    }
}

/// An environment wrapper that featurizes every state it hands out
///
/// The wrapped environment's action space is untouched; only `State` changes
/// to the `Vec<f32>` feature vector.
#[derive(Debug, Clone)]
pub struct FeaturizedEnv<E> {
    env: E,
    featurizer: RbfFeaturizer,
}

impl<E> FeaturizedEnv<E>
where
    E: Environment,
    E::State: AsRef<[f32]>,
{
    /// Wrap `env`, calibrating the featurizer on `n_samples` observation
    /// draws
    pub fn new(env: E, n_samples: usize) -> Self {
        let featurizer = RbfFeaturizer::fit(&env, n_samples);
        Self { env, featurizer }
    }

    /// Dimensionality of the featurized state
    pub fn state_dim(&self) -> usize {
        self.featurizer.output_dim()
    }

    /// The wrapped environment, e.g. to read its metric report
    pub fn inner(&self) -> &E {
        &self.env
    }
}

impl<E> Environment for FeaturizedEnv<E>
where
    E: Environment,
    E::State: AsRef<[f32]>,
{
    type State = Vec<f32>;
    type Action = E::Action;

    fn reset(&mut self) -> Self::State {
        let state = self.env.reset();
        self.featurizer.transform(state.as_ref())
    }

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        let (next_state, reward) = self.env.step(action);
        (
            next_state.map(|s| self.featurizer.transform(s.as_ref())),
            reward,
        )
    }

    fn render(&mut self) {
        self.env.render();
    }

    fn random_state(&self) -> Self::State {
        self.featurizer
            .transform(self.env.random_state().as_ref())
    }
}

impl<E> ContinuousActionSpace for FeaturizedEnv<E>
where
    E: ContinuousActionSpace,
    E::State: AsRef<[f32]>,
{
    fn action_dim(&self) -> usize {
        self.env.action_dim()
    }

    fn action_bounds(&self) -> (Vec<f32>, Vec<f32>) {
        self.env.action_bounds()
    }

    fn action_from_vec(action: Vec<f32>) -> Self::Action {
        E::action_from_vec(action)
    }
}
