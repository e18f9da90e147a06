//! On-policy Proximal Policy Optimization (PPO) for continuous control
//!
//! This crate implements a PPO agent for environments with continuous,
//! bounded action spaces. The agent collects whole episodes, converts them
//! into discounted returns and GAE advantages, and periodically runs a
//! clipped-surrogate update against a frozen snapshot of its own policy.
//!
//! Networks are built on [burn](https://burn.dev), so any autodiff backend
//! (ndarray, wgpu, ...) can be plugged in.
//!
//! # Layout
//!
//! - [`algo::ppo`] - the agent: trajectory buffer, episode history,
//!   advantage computation and the clipped update
//! - [`env`] - the environment contract and per-episode metric reports
//! - [`nn`] - network building blocks: a generic MLP and the Gaussian actor
//! - [`gym`] - bundled classic-control environments (pendulum swing-up,
//!   continuous mountain car)
//! - [`featurize`] - optional RBF state featurization, as an environment
//!   wrapper
//! - [`traits`] - tensor conversion and the trainable-agent surface

pub mod algo;
pub mod env;
pub mod featurize;
pub mod gym;
pub mod nn;
pub mod traits;
