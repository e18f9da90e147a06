//! Train a PPO agent on continuous mountain car, with RBF-featurized states.
//!
//! The raw 2-D state is a hard input for a small network, so the environment
//! is wrapped in a featurizer that lifts it to 400 random Fourier features
//! before the agent sees it.

use burn::backend::{
    ndarray::{NdArray, NdArrayDevice},
    Autodiff,
};
use once_cell::sync::Lazy;
use ppo_rl::{
    algo::ppo::{PPOAgent, PPOAgentConfig},
    featurize::FeaturizedEnv,
    gym::MountainCarContinuous,
    nn::{GaussianActorConfig, MLPConfig},
    traits::TrainableAgent,
};

type Backend = Autodiff<NdArray>;

static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

const NUM_EPISODES: usize = 300;
const CALIBRATION_SAMPLES: usize = 10_000;

fn main() -> anyhow::Result<()> {
    let mut env = FeaturizedEnv::new(MountainCarContinuous::new(999), CALIBRATION_SAMPLES);

    let state_dim = env.state_dim();
    let action_dim = 1; // engine force
    let action_scale = 1.0; // max |force|

    let actor =
        GaussianActorConfig::new(state_dim, action_dim, action_scale).init::<Backend>(&DEVICE);
    let critic = MLPConfig::new(state_dim, vec![200], 1).init::<Backend>(&DEVICE);

    let mut agent = PPOAgent::new(actor, critic, &env, PPOAgentConfig::default(), &DEVICE);

    let rewards = agent.learn(&mut env, NUM_EPISODES)?;
    let successes = rewards.iter().filter(|&&r| r > 50.0).count();
    for (window, chunk) in rewards.chunks(10).enumerate() {
        let mean = chunk.iter().sum::<f32>() / chunk.len() as f32;
        println!(
            "episodes {:>3}-{:>3}: mean reward {mean:9.1}",
            window * 10 + 1,
            window * 10 + chunk.len(),
        );
    }
    println!("goal reached in {successes}/{NUM_EPISODES} training episodes");

    let eval = agent.evaluate(&mut env, 10);
    let mean = eval.iter().sum::<f32>() / eval.len() as f32;
    println!("evaluation over {} episodes: mean reward {mean:.1}", eval.len());

    Ok(())
}
