//! Train a PPO agent on the pendulum swing-up task.

use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};
use once_cell::sync::Lazy;
use ppo_rl::{
    algo::ppo::{PPOAgent, PPOAgentConfig},
    gym::Pendulum,
    nn::{GaussianActorConfig, MLPConfig},
    traits::TrainableAgent,
};

type Backend = Autodiff<Wgpu>;

static DEVICE: Lazy<WgpuDevice> = Lazy::new(WgpuDevice::default);

const NUM_EPISODES: usize = 500;
const EPISODE_LENGTH: usize = 200;

fn main() -> anyhow::Result<()> {
    let mut env = Pendulum::new(EPISODE_LENGTH);

    let state_dim = 3; // [cos θ, sin θ, θ̇]
    let action_dim = 1; // torque
    let action_scale = 2.0; // max |torque|

    let actor =
        GaussianActorConfig::new(state_dim, action_dim, action_scale).init::<Backend>(&DEVICE);
    let critic = MLPConfig::new(state_dim, vec![200], 1).init::<Backend>(&DEVICE);

    let config = PPOAgentConfig {
        lr_actor: 1e-3,
        lr_critic: 2e-3,
        lr_decay: 0.99,
        ..Default::default()
    };
    let mut agent = PPOAgent::new(actor, critic, &env, config, &DEVICE);

    let rewards = agent.learn(&mut env, NUM_EPISODES)?;
    for (window, chunk) in rewards.chunks(10).enumerate() {
        let mean = chunk.iter().sum::<f32>() / chunk.len() as f32;
        println!(
            "episodes {:>3}-{:>3}: mean reward {mean:9.1}",
            window * 10 + 1,
            window * 10 + chunk.len(),
        );
    }

    let eval = agent.evaluate(&mut env, 10);
    let mean = eval.iter().sum::<f32>() / eval.len() as f32;
    println!("evaluation over {} episodes: mean reward {mean:.1}", eval.len());
    println!("total environment steps: {}", agent.total_steps());

    Ok(())
}
