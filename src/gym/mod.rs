//! Bundled classic-control environments with continuous action spaces

pub mod mountain_car;
pub mod pendulum;

pub use mountain_car::MountainCarContinuous;
pub use pendulum::Pendulum;
