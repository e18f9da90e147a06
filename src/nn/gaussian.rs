//! Gaussian (Normal) policy head for continuous actions
//!
//! The actor maps a batch of states to a diagonal Gaussian over actions. Its
//! parameterization keeps the distribution well-behaved by construction:
//! the mean is `scale * tanh(...)`, so it always lies inside the action
//! bounds, and the standard deviation goes through a softplus, so it is
//! strictly positive without any clipping.

use std::f64::consts::TAU;

use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
    tensor::{activation::softplus, backend::Backend, Distribution},
};

const LOG_TAU: f64 = 1.837_877_066_409_345_5; // ln(2π)

/// Configuration for [`GaussianActor`]
#[derive(Config, Debug)]
pub struct GaussianActorConfig {
    /// State (observation) dimension
    pub state_dim: usize,
    /// Action dimension
    pub action_dim: usize,
    /// Mean output range: means lie in `[-action_scale, action_scale]`
    ///
    /// For a box action space this is `max(|low|, |high|)`.
    pub action_scale: f32,
    /// Width of the shared hidden layer
    #[config(default = 30)]
    pub hidden_size: usize,
}

/// Actor network producing a [`Normal`] action distribution
///
/// Architecture: state → hidden (ReLU) → two parallel heads sharing the
/// hidden features: `mean = scale * tanh(Linear)` and
/// `std = softplus(Linear)`.
#[derive(Module, Debug)]
pub struct GaussianActor<B: Backend> {
    hidden: Linear<B>,
    mean_head: Linear<B>,
    std_head: Linear<B>,
    action_scale: f32,
}

impl GaussianActorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GaussianActor<B> {
        GaussianActor {
            hidden: LinearConfig::new(self.state_dim, self.hidden_size).init(device),
            mean_head: LinearConfig::new(self.hidden_size, self.action_dim).init(device),
            std_head: LinearConfig::new(self.hidden_size, self.action_dim).init(device),
            action_scale: self.action_scale,
        }
    }
}

impl<B: Backend> GaussianActor<B> {
    /// Forward pass: a `[batch, state_dim]` tensor to an action distribution
    pub fn forward(&self, states: Tensor<B, 2>) -> Normal<B> {
        let features = Relu.forward(self.hidden.forward(states));

        let mean = self
            .mean_head
            .forward(features.clone())
            .tanh()
            .mul_scalar(self.action_scale);
        let std = softplus(self.std_head.forward(features), 1.0);

        Normal { mean, std }
    }
}

/// A diagonal Gaussian over a `[batch, action_dim]` tensor
///
/// All operations stay on tensors, so densities and entropies remain
/// differentiable with respect to the parameters that produced `mean` and
/// `std`.
#[derive(Debug, Clone)]
pub struct Normal<B: Backend> {
    pub mean: Tensor<B, 2>,
    pub std: Tensor<B, 2>,
}

impl<B: Backend> Normal<B> {
    /// Draw one reparameterized sample: `mean + std * ε`, `ε ~ N(0, 1)`
    pub fn sample(&self) -> Tensor<B, 2> {
        let noise = Tensor::random_like(&self.mean, Distribution::Normal(0.0, 1.0));
        self.mean.clone() + self.std.clone() * noise
    }

    /// Per-dimension probability density at `value`
    pub fn prob(&self, value: &Tensor<B, 2>) -> Tensor<B, 2> {
        let z = (value.clone() - self.mean.clone()) / self.std.clone();
        let norm = self.std.clone().mul_scalar(TAU.sqrt() as f32);
        z.powf_scalar(2.0).mul_scalar(-0.5).exp() / norm
    }

    /// Per-dimension log density at `value`
    pub fn log_prob(&self, value: &Tensor<B, 2>) -> Tensor<B, 2> {
        let z = (value.clone() - self.mean.clone()) / self.std.clone();
        z.powf_scalar(2.0)
            .mul_scalar(-0.5)
            .sub(self.std.clone().log())
            .sub_scalar((0.5 * LOG_TAU) as f32)
    }

    /// Per-dimension differential entropy: `0.5 * (1 + ln 2π) + ln σ`
    pub fn entropy(&self) -> Tensor<B, 2> {
        self.std
            .clone()
            .log()
            .add_scalar((0.5 * (1.0 + LOG_TAU)) as f32)
    }
}
