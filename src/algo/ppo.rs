//! Proximal Policy Optimization (PPO) for continuous action spaces
//!
//! On-policy actor-critic with a clipped surrogate objective: the agent
//! collects whole episodes, turns each finished episode into discounted
//! returns and GAE advantages, and every few episodes runs several epochs of
//! shuffled minibatch updates. The probability ratio is taken against a
//! frozen snapshot of the policy (synchronized once per training pass), and
//! the clip keeps any single pass from moving the policy too far.
//!
//! ```ignore
//! use ppo_rl::{
//!     algo::ppo::{PPOAgent, PPOAgentConfig},
//!     gym::Pendulum,
//!     nn::{GaussianActorConfig, MLPConfig},
//!     traits::TrainableAgent,
//! };
//!
//! let mut env = Pendulum::new(200);
//! let actor = GaussianActorConfig::new(3, 1, 2.0).init(&*DEVICE);
//! let critic = MLPConfig::new(3, vec![200], 1).init(&*DEVICE);
//! let mut agent = PPOAgent::new(actor, critic, &env, PPOAgentConfig::default(), &*DEVICE);
//! let rewards = agent.learn(&mut env, 500)?;
//! ```
//!
//! Reference: "Proximal Policy Optimization Algorithms" (Schulman et al., 2017)

use anyhow::{bail, Result};
use std::path::Path;

use burn::{
    nn::loss::{MseLoss, Reduction},
    optim::{adaptor::OptimizerAdaptor, AdamW, AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::backend::AutodiffBackend,
};
use rand::{seq::SliceRandom, thread_rng};

use crate::{
    env::{ContinuousActionSpace, Environment},
    nn::{GaussianActor, MLP},
    traits::{ToTensor, TrainableAgent, TrainingMetrics},
};

/// Additive floor on the reference-policy density, so the ratio never
/// divides by zero.
const RATIO_EPS: f32 = 1e-10;

/// Configuration for the [`PPOAgent`]
#[derive(Debug, Clone)]
pub struct PPOAgentConfig {
    /// Discount factor γ
    ///
    /// **Default:** `0.95`
    pub reward_decay: f32,
    /// GAE factor λ; `0.0` reduces advantages to one-step TD residuals
    ///
    /// **Default:** `0.95`
    pub gae_lambda: f32,
    /// Clipping parameter ε for the probability ratio
    ///
    /// **Default:** `0.2`
    pub clip_epsilon: f32,
    /// Entropy bonus coefficient, encourages exploration
    ///
    /// **Default:** `1e-3`
    pub entropy_coef: f32,
    /// Minibatch size; a shuffled remainder smaller than this is dropped
    ///
    /// **Default:** `64`
    pub batch_size: usize,
    /// Number of update epochs per training pass
    ///
    /// **Default:** `10`
    pub n_epochs: usize,
    /// Episodes to collect between training passes; values below 1 are
    /// treated as 1 (a pass after every episode)
    ///
    /// **Default:** `5`
    pub training_cadence: usize,
    /// Actor learning rate
    ///
    /// **Default:** `0.01`
    pub lr_actor: f64,
    /// Critic learning rate
    ///
    /// **Default:** `0.01`
    pub lr_critic: f64,
    /// Multiplicative decay applied to both learning rates after every
    /// training pass
    ///
    /// **Default:** `0.95`
    pub lr_decay: f64,
}

impl Default for PPOAgentConfig {
    fn default() -> Self {
        Self {
            reward_decay: 0.95,
            gae_lambda: 0.95,
            clip_epsilon: 0.2,
            entropy_coef: 1e-3,
            batch_size: 64,
            n_epochs: 10,
            training_cadence: 5,
            lr_actor: 0.01,
            lr_critic: 0.01,
            lr_decay: 0.95,
        }
    }
}

/// Per-step storage for the episode currently in progress
#[derive(Clone, Debug)]
struct Trajectory<S, A> {
    states: Vec<S>,
    actions: Vec<A>,
    rewards: Vec<f32>,
}

impl<S, A> Trajectory<S, A> {
    fn new() -> Self {
        Self {
            states: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
        }
    }

    fn push(&mut self, state: S, action: A, reward: f32) {
        self.states.push(state);
        self.actions.push(action);
        self.rewards.push(reward);
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// One finished episode, ready for training
///
/// Keeping the four fields in a single record means their row counts cannot
/// drift apart between episode end and the training pass.
#[derive(Clone, Debug)]
struct EpisodeBatch<S, A> {
    states: Vec<S>,
    actions: Vec<A>,
    discounted_returns: Vec<f32>,
    advantages: Vec<f32>,
}

impl<S, A> EpisodeBatch<S, A> {
    fn len(&self) -> usize {
        self.states.len()
    }
}

/// Backward cumulative sum with multiplicative decay
///
/// `out[t] = values[t] + decay * out[t + 1]`, seeded with `tail` past the
/// end. With the reward sequence and decay γ this yields discounted returns;
/// with TD residuals and decay γλ it yields GAE advantages.
pub fn discounted_cumsum(values: &[f32], decay: f32, tail: f32) -> Vec<f32> {
    let mut out = vec![0.0; values.len()];
    let mut running = tail;
    for t in (0..values.len()).rev() {
        running = running * decay + values[t];
        out[t] = running;
    }
    out
}

fn gather<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

fn column<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_data(
        TensorData::from(values).convert::<B::FloatElem>(),
        device,
    )
    .unsqueeze_dim(1)
}

/// A PPO agent for continuous control
///
/// ### Generics
/// - `B` - A burn autodiff backend
/// - `E` - Environment with a bounded continuous action space
pub struct PPOAgent<B, E>
where
    B: AutodiffBackend,
    E: Environment + ContinuousActionSpace,
{
    // Networks (Option for ownership during optimization). `actor_ref` is the
    // frozen snapshot the probability ratio is taken against; it only ever
    // changes through `sync_reference`.
    actor: Option<GaussianActor<B>>,
    actor_ref: GaussianActor<B>,
    critic: Option<MLP<B>>,

    // Episode bookkeeping
    trajectory: Trajectory<E::State, E::Action>,
    history: Vec<EpisodeBatch<E::State, E::Action>>,

    device: &'static B::Device,

    // Hyperparameters
    gamma: f32,
    gae_lambda: f32,
    clip_epsilon: f32,
    entropy_coef: f32,
    batch_size: usize,
    n_epochs: usize,
    training_cadence: usize,
    lr_decay: f64,

    // Learning-rate state, decayed once per training pass
    lr_actor: f64,
    lr_critic: f64,

    // Action space info
    action_dim: usize,
    action_low: Vec<f32>,
    action_high: Vec<f32>,

    total_steps: usize,

    // Optimizers (persistent, so moment estimates survive across passes)
    optimizer_actor: OptimizerAdaptor<AdamW, GaussianActor<B>, B>,
    optimizer_critic: OptimizerAdaptor<AdamW, MLP<B>, B>,
}

impl<B, E> PPOAgent<B, E>
where
    B: AutodiffBackend,
    E: Environment + ContinuousActionSpace,
    Vec<E::State>: ToTensor<B, 2, Float>,
    Vec<E::Action>: ToTensor<B, 2, Float>,
{
    /// Create a new PPO agent
    ///
    /// The reference policy starts as a copy of `actor`; the `env` reference
    /// is only used to read the action space bounds.
    pub fn new(
        actor: GaussianActor<B>,
        critic: MLP<B>,
        env: &E,
        config: PPOAgentConfig,
        device: &'static B::Device,
    ) -> Self {
        let (action_low, action_high) = env.action_bounds();
        let actor_ref = actor.clone();

        Self {
            actor: Some(actor),
            actor_ref,
            critic: Some(critic),
            trajectory: Trajectory::new(),
            history: Vec::new(),
            device,
            gamma: config.reward_decay,
            gae_lambda: config.gae_lambda,
            clip_epsilon: config.clip_epsilon,
            entropy_coef: config.entropy_coef,
            batch_size: config.batch_size,
            n_epochs: config.n_epochs,
            training_cadence: config.training_cadence.max(1),
            lr_decay: config.lr_decay,
            lr_actor: config.lr_actor,
            lr_critic: config.lr_critic,
            action_dim: env.action_dim(),
            action_low,
            action_high,
            total_steps: 0,
            optimizer_actor: AdamWConfig::new().init(),
            optimizer_critic: AdamWConfig::new().init(),
        }
    }

    /// Current actor and critic learning rates
    pub fn learning_rates(&self) -> (f64, f64) {
        (self.lr_actor, self.lr_critic)
    }

    /// Sample one action from the current policy and clip it to the action
    /// bounds
    pub fn select_action(&self, state: &E::State) -> E::Action {
        let states = vec![state.clone()].to_tensor(self.device);
        let actor = self.actor.as_ref().expect("actor network not initialized");

        let raw = actor.forward(states).sample().into_data();
        let clipped: Vec<f32> = raw
            .iter::<f32>()
            .zip(self.action_low.iter().zip(self.action_high.iter()))
            .map(|(a, (&low, &high))| a.clamp(low, high))
            .collect();

        E::action_from_vec(clipped)
    }

    /// Copy every parameter of the current policy into the reference policy
    ///
    /// Called once at the start of each training pass, before any ratio is
    /// computed. The copy is plain data movement; no gradients attach to it.
    pub fn sync_reference(&mut self) {
        self.actor_ref = self
            .actor
            .as_ref()
            .expect("actor network not initialized")
            .clone();
    }

    /// Convert the finished episode in the trajectory buffer into an
    /// [`EpisodeBatch`] and append it to the history
    fn process_episode(&mut self) {
        if self.trajectory.is_empty() {
            return;
        }
        let states = std::mem::take(&mut self.trajectory.states);
        let actions = std::mem::take(&mut self.trajectory.actions);
        let rewards = std::mem::take(&mut self.trajectory.rewards);

        let discounted_returns = discounted_cumsum(&rewards, self.gamma, 0.0);

        // V(s_0..s_{T-1}) plus a terminal value of 0: episodes always run to
        // termination, so there is no bootstrap.
        let critic = self.critic.as_ref().expect("critic network not initialized");
        let value_t = critic.forward(states.clone().to_tensor(self.device));
        let mut values: Vec<f32> = value_t.into_data().iter::<f32>().collect();
        values.push(0.0);

        let deltas: Vec<f32> = rewards
            .iter()
            .enumerate()
            .map(|(t, &r)| r + self.gamma * values[t + 1] - values[t])
            .collect();
        let advantages = discounted_cumsum(&deltas, self.gamma * self.gae_lambda, 0.0);

        self.history.push(EpisodeBatch {
            states,
            actions,
            discounted_returns,
            advantages,
        });
    }

    /// Run one training pass over the accumulated episode history
    ///
    /// Fails if the history is empty; calling this without collected data is
    /// a caller error, not something to silently skip.
    pub fn train_pass(&mut self) -> Result<TrainingMetrics> {
        if self.history.is_empty() {
            bail!("training pass requested with an empty episode history");
        }

        self.sync_reference();

        // Concatenate all episode batches row-wise
        let n: usize = self.history.iter().map(EpisodeBatch::len).sum();
        let mut states = Vec::with_capacity(n);
        let mut actions = Vec::with_capacity(n);
        let mut returns = Vec::with_capacity(n);
        let mut advantages = Vec::with_capacity(n);
        for episode in &self.history {
            states.extend(episode.states.iter().cloned());
            actions.extend(episode.actions.iter().cloned());
            returns.extend_from_slice(&episode.discounted_returns);
            advantages.extend_from_slice(&episode.advantages);
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut total_policy_loss = 0.0_f32;
        let mut total_value_loss = 0.0_f32;
        let mut total_entropy = 0.0_f32;
        let mut n_updates = 0_usize;

        for _epoch in 0..self.n_epochs {
            // One permutation drives all four sequences, so rows stay aligned
            indices.shuffle(&mut thread_rng());

            for batch in indices.chunks_exact(self.batch_size) {
                let batch_states: Tensor<B, 2> =
                    gather(&states, batch).to_tensor(self.device);
                let batch_actions: Tensor<B, 2> =
                    gather(&actions, batch).to_tensor(self.device);
                let batch_returns = column::<B>(&gather(&returns, batch), self.device);
                let batch_advantages =
                    column::<B>(&gather(&advantages, batch), self.device);

                // Actor update: clipped surrogate plus entropy bonus
                {
                    let actor = self.actor.take().expect("actor network not initialized");

                    let dist = actor.forward(batch_states.clone());
                    let old_dist = self.actor_ref.forward(batch_states.clone());

                    let prob = dist.prob(&batch_actions);
                    let old_prob = old_dist
                        .prob(&batch_actions)
                        .detach()
                        .add_scalar(RATIO_EPS);
                    let ratio = prob / old_prob;

                    let adv = batch_advantages
                        .clone()
                        .expand([self.batch_size, self.action_dim]);
                    let surr = ratio.clone() * adv.clone();
                    let surr_clipped = ratio
                        .clamp(1.0 - self.clip_epsilon, 1.0 + self.clip_epsilon)
                        * adv;

                    let entropy = dist.entropy().mean();
                    let actor_loss = surr
                        .min_pair(surr_clipped)
                        .mean()
                        .neg()
                        .sub(entropy.clone().mul_scalar(self.entropy_coef));

                    total_policy_loss += actor_loss.clone().into_scalar().elem::<f32>();
                    total_entropy += entropy.into_scalar().elem::<f32>();

                    let grads = GradientsParams::from_grads(actor_loss.backward(), &actor);
                    self.actor =
                        Some(self.optimizer_actor.step(self.lr_actor, actor, grads));
                }

                // Critic update: regression toward the discounted returns
                {
                    let critic =
                        self.critic.take().expect("critic network not initialized");

                    let values = critic.forward(batch_states);
                    let value_loss =
                        MseLoss::new().forward(values, batch_returns, Reduction::Mean);

                    total_value_loss += value_loss.clone().into_scalar().elem::<f32>();

                    let grads =
                        GradientsParams::from_grads(value_loss.backward(), &critic);
                    self.critic =
                        Some(self.optimizer_critic.step(self.lr_critic, critic, grads));
                }

                n_updates += 1;
            }
        }

        self.lr_actor *= self.lr_decay;
        self.lr_critic *= self.lr_decay;
        self.history.clear();

        let denom = n_updates.max(1) as f32;
        Ok(TrainingMetrics {
            policy_loss: total_policy_loss / denom,
            value_loss: total_value_loss / denom,
            entropy: total_entropy / denom,
            n_updates,
        })
    }

    /// Run one episode to termination
    ///
    /// With `record` set, transitions feed the trajectory buffer and the
    /// episode is folded into the history on termination.
    fn run_episode(&mut self, env: &mut E, record: bool) -> f32 {
        let mut state = env.reset();
        let mut total_reward = 0.0;

        loop {
            env.render();
            let action = self.select_action(&state);
            let (next_state, reward) = env.step(action.clone());
            total_reward += reward;
            self.total_steps += 1;

            if record {
                self.trajectory.push(state, action, reward);
            }

            match next_state {
                Some(next) => state = next,
                None => break,
            }
        }

        if record {
            self.process_episode();
        }
        total_reward
    }

    /// Snapshot actor, reference policy and critic parameters under `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let dir = dir.as_ref();

        self.actor
            .clone()
            .expect("actor network not initialized")
            .save_file(dir.join("actor"), &recorder)?;
        self.actor_ref.clone().save_file(dir.join("actor_ref"), &recorder)?;
        self.critic
            .clone()
            .expect("critic network not initialized")
            .save_file(dir.join("critic"), &recorder)?;
        Ok(())
    }

    /// Restore parameters previously written by [`save`](Self::save)
    pub fn load<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let dir = dir.as_ref();

        let actor = self.actor.take().expect("actor network not initialized");
        self.actor = Some(actor.load_file(dir.join("actor"), &recorder, self.device)?);
        self.actor_ref = self
            .actor_ref
            .clone()
            .load_file(dir.join("actor_ref"), &recorder, self.device)?;
        let critic = self.critic.take().expect("critic network not initialized");
        self.critic = Some(critic.load_file(dir.join("critic"), &recorder, self.device)?);
        Ok(())
    }
}

impl<B, E> TrainableAgent<E> for PPOAgent<B, E>
where
    B: AutodiffBackend,
    E: Environment + ContinuousActionSpace,
    Vec<E::State>: ToTensor<B, 2, Float>,
    Vec<E::Action>: ToTensor<B, 2, Float>,
{
    fn learn(&mut self, env: &mut E, n_episodes: usize) -> Result<Vec<f32>> {
        let mut rewards = Vec::with_capacity(n_episodes);
        for episode in 0..n_episodes {
            // Train on the accumulated history before the next reset
            if episode > 0 && episode % self.training_cadence == 0 {
                self.train_pass()?;
            }
            rewards.push(self.run_episode(env, true));
        }
        Ok(rewards)
    }

    fn evaluate(&mut self, env: &mut E, n_episodes: usize) -> Vec<f32> {
        (0..n_episodes)
            .map(|_| self.run_episode(env, false))
            .collect()
    }

    fn total_steps(&self) -> usize {
        self.total_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{GaussianActorConfig, MLPConfig};
    use burn::backend::{
        ndarray::{NdArray, NdArrayDevice},
        Autodiff,
    };
    use once_cell::sync::Lazy;
    use rand::Rng;

    type TB = Autodiff<NdArray>;

    static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

    /// 1-D environment: two-step episodes, reward `-|position|`
    #[derive(Debug, Clone, Default)]
    struct LineEnv {
        position: f32,
        steps: usize,
    }

    impl Environment for LineEnv {
        type State = [f32; 1];
        type Action = [f32; 1];

        fn reset(&mut self) -> Self::State {
            self.position = 1.0;
            self.steps = 0;
            [self.position]
        }

        fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
            self.position += action[0];
            self.steps += 1;
            let reward = -self.position.abs();
            let next = (self.steps < 2).then(|| [self.position]);
            (next, reward)
        }

        fn random_state(&self) -> Self::State {
            [thread_rng().gen_range(-1.0..1.0)]
        }
    }

    impl ContinuousActionSpace for LineEnv {
        fn action_dim(&self) -> usize {
            1
        }

        fn action_bounds(&self) -> (Vec<f32>, Vec<f32>) {
            (vec![-1.0], vec![1.0])
        }

        fn action_from_vec(action: Vec<f32>) -> Self::Action {
            [action[0]]
        }
    }

    fn line_agent(config: PPOAgentConfig) -> (PPOAgent<TB, LineEnv>, LineEnv) {
        let env = LineEnv::default();
        let actor = GaussianActorConfig::new(1, 1, 1.0).init::<TB>(&DEVICE);
        let critic = MLPConfig::new(1, vec![16], 1).init::<TB>(&DEVICE);
        (PPOAgent::new(actor, critic, &env, config, &DEVICE), env)
    }

    #[test]
    fn discounted_cumsum_recursion() {
        let rewards = [1.0, -0.5, 2.0, 0.3];
        let gamma = 0.9;
        let out = discounted_cumsum(&rewards, gamma, 0.0);

        assert_eq!(out.len(), rewards.len());
        assert!((out[3] - rewards[3]).abs() < 1e-6);
        for t in 0..3 {
            let expected = rewards[t] + gamma * out[t + 1];
            assert!((out[t] - expected).abs() < 1e-6, "mismatch at t={t}");
        }
    }

    #[test]
    fn discounted_cumsum_tail_seeds_last_entry() {
        let out = discounted_cumsum(&[2.0], 0.5, 10.0);
        assert!((out[0] - (2.0 + 0.5 * 10.0)).abs() < 1e-6);
    }

    #[test]
    fn zero_lambda_reduces_to_td_residuals() {
        // With λ = 0 the GAE decay is γλ = 0 and the backward sum returns
        // the TD residuals untouched.
        let deltas = [0.7, -1.2, 0.05, 3.0];
        let out = discounted_cumsum(&deltas, 0.95 * 0.0, 0.0);
        assert_eq!(out, deltas.to_vec());
    }

    #[test]
    fn ratio_is_one_after_sync() {
        let (mut agent, _env) = line_agent(PPOAgentConfig::default());
        agent.sync_reference();

        let states = Tensor::<TB, 2>::random(
            [32, 1],
            burn::tensor::Distribution::Uniform(-2.0, 2.0),
            &DEVICE,
        );
        let dist = agent.actor.as_ref().unwrap().forward(states.clone());
        let old_dist = agent.actor_ref.forward(states);
        let actions = dist.sample();

        let ratio = dist.prob(&actions) / old_dist.prob(&actions).add_scalar(RATIO_EPS);
        for &r in ratio.into_data().as_slice::<f32>().unwrap() {
            assert!((r - 1.0).abs() < 1e-4, "ratio {r} drifted from 1");
        }
    }

    #[test]
    fn clipped_surrogate_is_bounded() {
        let eps = 0.2_f32;
        let device = &*DEVICE;
        let ratio = Tensor::<TB, 2>::from_floats([[0.5], [1.0], [1.7]], device);

        for adv in [2.0_f32, -2.0] {
            let adv_t = Tensor::<TB, 2>::full([3, 1], adv, device);
            let surr = ratio.clone() * adv_t.clone();
            let clipped = ratio.clone().clamp(1.0 - eps, 1.0 + eps) * adv_t;
            let objective = surr.min_pair(clipped.clone());

            // The clipped term is bounded by the clip range on both sides
            for &c in clipped.into_data().as_slice::<f32>().unwrap() {
                if adv > 0.0 {
                    assert!(c <= (1.0 + eps) * adv + 1e-6);
                } else {
                    assert!(c >= (1.0 + eps) * adv - 1e-6);
                }
            }

            // For positive advantages the min objective inherits the cap.
            // For negative ones it is unbounded below on purpose: the min
            // keeps the pessimistic unclipped term, so a ratio far above
            // 1 + ε still produces a strong corrective gradient.
            if adv > 0.0 {
                for &o in objective.into_data().as_slice::<f32>().unwrap() {
                    assert!(o <= (1.0 + eps) * adv + 1e-6);
                }
            } else {
                let worst: f32 = objective.min().into_scalar().elem();
                assert!(worst < (1.0 + eps) * adv, "expected the min to dip below the clip bound, got {worst}");
            }
        }
    }

    #[test]
    fn selected_actions_stay_in_bounds() {
        let (agent, _env) = line_agent(PPOAgentConfig::default());
        for _ in 0..50 {
            let action = agent.select_action(&[0.3]);
            assert!((-1.0..=1.0).contains(&action[0]), "action {}", action[0]);
        }
    }

    #[test]
    fn shuffled_minibatches_keep_rows_aligned() {
        // action[i] = 2 * state[i], advantage[i] = i
        let states: Vec<[f32; 1]> = (0..100).map(|i| [i as f32]).collect();
        let actions: Vec<[f32; 1]> = (0..100).map(|i| [2.0 * i as f32]).collect();
        let advantages: Vec<f32> = (0..100).map(|i| i as f32).collect();

        let mut indices: Vec<usize> = (0..100).collect();
        indices.shuffle(&mut thread_rng());

        for batch in indices.chunks_exact(16) {
            let s = gather(&states, batch);
            let a = gather(&actions, batch);
            let adv = gather(&advantages, batch);
            for row in 0..batch.len() {
                assert_eq!(a[row][0], 2.0 * s[row][0]);
                assert_eq!(adv[row], s[row][0]);
            }
        }
    }

    #[test]
    fn process_episode_builds_aligned_batch() {
        let (mut agent, mut env) = line_agent(PPOAgentConfig::default());
        agent.run_episode(&mut env, true);

        assert_eq!(agent.history.len(), 1);
        let episode = &agent.history[0];
        assert_eq!(episode.states.len(), 2);
        assert_eq!(episode.actions.len(), 2);
        assert_eq!(episode.discounted_returns.len(), 2);
        assert_eq!(episode.advantages.len(), 2);

        // The last discounted return is exactly the last reward
        let last_return = episode.discounted_returns[1];
        let expected = -(episode.states[1][0] + episode.actions[1][0]).abs();
        assert!((last_return - expected).abs() < 1e-6);
    }

    #[test]
    fn train_pass_decays_rates_and_clears_history() {
        let config = PPOAgentConfig {
            batch_size: 1,
            n_epochs: 1,
            ..Default::default()
        };
        let (mut agent, mut env) = line_agent(config);

        agent.run_episode(&mut env, true);
        let (lr_actor, lr_critic) = agent.learning_rates();

        let metrics = agent.train_pass().unwrap();

        assert!(agent.history.is_empty());
        assert_eq!(agent.lr_actor, lr_actor * agent.lr_decay);
        assert_eq!(agent.lr_critic, lr_critic * agent.lr_decay);
        // One 2-step episode, batch size 1, one epoch
        assert_eq!(metrics.n_updates, 2);
    }

    #[test]
    fn train_pass_on_empty_history_is_an_error() {
        let (mut agent, _env) = line_agent(PPOAgentConfig::default());
        assert!(agent.train_pass().is_err());
    }

    #[test]
    fn learn_and_evaluate_return_one_reward_per_episode() {
        let config = PPOAgentConfig {
            batch_size: 1,
            n_epochs: 1,
            training_cadence: 2,
            ..Default::default()
        };
        let (mut agent, mut env) = line_agent(config);

        let rewards = agent.learn(&mut env, 3).unwrap();
        assert_eq!(rewards.len(), 3);
        assert_eq!(agent.total_steps(), 6);

        let eval_rewards = agent.evaluate(&mut env, 2);
        assert_eq!(eval_rewards.len(), 2);
        // Evaluation must not buffer anything
        assert!(agent.trajectory.is_empty());
    }

    #[test]
    fn zero_training_cadence_means_every_episode() {
        let config = PPOAgentConfig {
            batch_size: 1,
            n_epochs: 1,
            training_cadence: 0,
            ..Default::default()
        };
        let (mut agent, mut env) = line_agent(config);
        assert_eq!(agent.training_cadence, 1);

        let (lr_before, _) = agent.learning_rates();
        let rewards = agent.learn(&mut env, 2).unwrap();
        assert_eq!(rewards.len(), 2);
        // One training pass ran between the two episodes
        let (lr_after, _) = agent.learning_rates();
        assert_eq!(lr_after, lr_before * agent.lr_decay);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (agent, env) = line_agent(PPOAgentConfig::default());
        let dir = tempfile::tempdir().unwrap();

        agent.save(dir.path()).unwrap();

        let actor = GaussianActorConfig::new(1, 1, 1.0).init::<TB>(&DEVICE);
        let critic = MLPConfig::new(1, vec![16], 1).init::<TB>(&DEVICE);
        let mut restored =
            PPOAgent::new(actor, critic, &env, PPOAgentConfig::default(), &DEVICE);
        restored.load(dir.path()).unwrap();

        // Same parameters produce the same distribution
        let states = Tensor::<TB, 2>::from_floats([[0.4]], &DEVICE);
        let a: f32 = agent
            .actor
            .as_ref()
            .unwrap()
            .forward(states.clone())
            .mean
            .into_scalar()
            .elem();
        let b: f32 = restored
            .actor
            .as_ref()
            .unwrap()
            .forward(states)
            .mean
            .into_scalar()
            .elem();
        assert!((a - b).abs() < 1e-6);
    }
}
