//! Neural network building blocks

pub mod gaussian;
pub mod mlp;

pub use gaussian::{GaussianActor, GaussianActorConfig, Normal};
pub use mlp::{MLP, MLPConfig};
