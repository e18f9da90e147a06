use rand::{thread_rng, Rng};
use std::f32::consts::PI;

use crate::env::{ContinuousActionSpace, Environment, Report};

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const GRAVITY: f32 = 10.0;
const MASS: f32 = 1.0;
const LENGTH: f32 = 1.0;

/// State: [cos(θ), sin(θ), θ̇]
pub type PendulumState = [f32; 3];

/// Action: torque in `[-2, 2]`
pub type PendulumAction = [f32; 1];

/// Pendulum swing-up with a continuous torque action
///
/// The angle is exposed as (cos, sin) so the state has no wrap-around
/// discontinuity. Reward is `-(θ² + 0.1·θ̇² + 0.001·u²)`: zero when balanced
/// upright with no torque, increasingly negative otherwise. Episodes run a
/// fixed number of steps.
#[derive(Debug, Clone)]
pub struct Pendulum {
    theta: f32,
    theta_dot: f32,
    steps: usize,
    max_steps: usize,
    pub report: Report,
}

impl Pendulum {
    /// `max_steps` is the fixed episode length (200 is customary)
    pub fn new(max_steps: usize) -> Self {
        Self {
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            max_steps,
            report: Report::new(vec!["reward"]),
        }
    }

    fn observe(&self) -> PendulumState {
        [self.theta.cos(), self.theta.sin(), self.theta_dot]
    }

    fn wrap_angle(x: f32) -> f32 {
        ((x + PI).rem_euclid(2.0 * PI)) - PI
    }
}

impl Environment for Pendulum {
    type State = PendulumState;
    type Action = PendulumAction;

    fn reset(&mut self) -> Self::State {
        let mut rng = thread_rng();
        self.theta = rng.gen_range(-PI..PI);
        self.theta_dot = rng.gen_range(-1.0..1.0);
        self.steps = 0;
        self.observe()
    }

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        let torque = action[0].clamp(-MAX_TORQUE, MAX_TORQUE);

        // θ̈ = (3g / 2L)·sin(θ) + (3 / mL²)·u
        let theta_acc = (3.0 * GRAVITY / (2.0 * LENGTH)) * self.theta.sin()
            + (3.0 / (MASS * LENGTH * LENGTH)) * torque;

        self.theta_dot = (self.theta_dot + theta_acc * DT).clamp(-MAX_SPEED, MAX_SPEED);
        self.theta = Self::wrap_angle(self.theta + self.theta_dot * DT);

        let reward = -(self.theta.powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * torque.powi(2));

        self.steps += 1;
        self.report
            .entry("reward")
            .and_modify(|x| *x += reward as f64);

        let next_state = (self.steps < self.max_steps).then(|| self.observe());
        (next_state, reward)
    }

    fn random_state(&self) -> Self::State {
        let mut rng = thread_rng();
        let theta: f32 = rng.gen_range(-PI..PI);
        [theta.cos(), theta.sin(), rng.gen_range(-MAX_SPEED..MAX_SPEED)]
    }
}

impl ContinuousActionSpace for Pendulum {
    fn action_dim(&self) -> usize {
        1
    }

    fn action_bounds(&self) -> (Vec<f32>, Vec<f32>) {
        (vec![-MAX_TORQUE], vec![MAX_TORQUE])
    }

    fn action_from_vec(action: Vec<f32>) -> Self::Action {
        [action[0]]
    }
}
