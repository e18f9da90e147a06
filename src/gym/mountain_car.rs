use rand::{thread_rng, Rng};

use crate::env::{ContinuousActionSpace, Environment, Report};

const MIN_POSITION: f32 = -1.2;
const MAX_POSITION: f32 = 0.6;
const MAX_SPEED: f32 = 0.07;
const GOAL_POSITION: f32 = 0.45;
const FORCE_SCALE: f32 = 0.0015;
const GRAVITY_SCALE: f32 = 0.0025;
const MAX_FORCE: f32 = 1.0;

/// State: [position, velocity]
pub type MountainCarState = [f32; 2];

/// Action: engine force in `[-1, 1]`
pub type MountainCarAction = [f32; 1];

/// Continuous-action mountain car
///
/// An underpowered car sits in a valley and must build momentum to reach the
/// flag on the right hill. Each step costs `0.1·force²`; reaching the goal
/// pays `+100` and ends the episode, so the optimal policy spends as little
/// fuel as possible. A step cap keeps hopeless episodes finite.
#[derive(Debug, Clone)]
pub struct MountainCarContinuous {
    position: f32,
    velocity: f32,
    steps: usize,
    max_steps: usize,
    pub report: Report,
}

impl MountainCarContinuous {
    /// `max_steps` bounds the episode length (999 matches the gym default)
    pub fn new(max_steps: usize) -> Self {
        Self {
            position: -0.5,
            velocity: 0.0,
            steps: 0,
            max_steps,
            report: Report::new(vec!["reward"]),
        }
    }

    fn observe(&self) -> MountainCarState {
        [self.position, self.velocity]
    }
}

impl Environment for MountainCarContinuous {
    type State = MountainCarState;
    type Action = MountainCarAction;

    fn reset(&mut self) -> Self::State {
        self.position = thread_rng().gen_range(-0.6..-0.4);
        self.velocity = 0.0;
        self.steps = 0;
        self.observe()
    }

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        let force = action[0].clamp(-MAX_FORCE, MAX_FORCE);

        self.velocity += force * FORCE_SCALE - GRAVITY_SCALE * (3.0 * self.position).cos();
        self.velocity = self.velocity.clamp(-MAX_SPEED, MAX_SPEED);
        self.position = (self.position + self.velocity).clamp(MIN_POSITION, MAX_POSITION);
        // The left wall is inelastic
        if self.position <= MIN_POSITION && self.velocity < 0.0 {
            self.velocity = 0.0;
        }
        self.steps += 1;

        let reached_goal = self.position >= GOAL_POSITION;
        let mut reward = -0.1 * force.powi(2);
        if reached_goal {
            reward += 100.0;
        }

        self.report
            .entry("reward")
            .and_modify(|x| *x += reward as f64);

        let done = reached_goal || self.steps >= self.max_steps;
        let next_state = (!done).then(|| self.observe());
        (next_state, reward)
    }

    fn random_state(&self) -> Self::State {
        let mut rng = thread_rng();
        [
            rng.gen_range(MIN_POSITION..MAX_POSITION),
            rng.gen_range(-MAX_SPEED..MAX_SPEED),
        ]
    }
}

impl ContinuousActionSpace for MountainCarContinuous {
    fn action_dim(&self) -> usize {
        1
    }

    fn action_bounds(&self) -> (Vec<f32>, Vec<f32>) {
        (vec![-MAX_FORCE], vec![MAX_FORCE])
    }

    fn action_from_vec(action: Vec<f32>) -> Self::Action {
        [action[0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_the_valley() {
        let mut env = MountainCarContinuous::new(999);
        let [position, velocity] = env.reset();
        assert!((-0.6..-0.4).contains(&position));
        assert_eq!(velocity, 0.0);
    }

    #[test]
    fn reaching_the_goal_terminates_with_bonus() {
        let mut env = MountainCarContinuous::new(999);
        env.reset();
        env.position = GOAL_POSITION - 0.001;
        env.velocity = MAX_SPEED;

        let (next_state, reward) = env.step([0.0]);
        assert!(next_state.is_none());
        assert!(reward > 99.0);
    }

    #[test]
    fn idling_costs_nothing_but_time() {
        let mut env = MountainCarContinuous::new(5);
        env.reset();
        for _ in 0..4 {
            let (next, reward) = env.step([0.0]);
            assert_eq!(reward, 0.0);
            assert!(next.is_some());
        }
        let (next, _) = env.step([0.0]);
        assert!(next.is_none(), "step cap must end the episode");
    }

    #[test]
    fn force_is_clamped_and_state_bounded() {
        let mut env = MountainCarContinuous::new(999);
        env.reset();
        for _ in 0..200 {
            let ([position, velocity], _) = match env.step([5.0]) {
                (Some(s), r) => (s, r),
                (None, _) => break,
            };
            assert!((MIN_POSITION..=MAX_POSITION).contains(&position));
            assert!(velocity.abs() <= MAX_SPEED);
        }
    }
}
