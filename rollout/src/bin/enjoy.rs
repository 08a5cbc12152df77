//! Rolls out a trained policy on cart-pole and reports episode rewards.
use anyhow::Result;
use clap::Parser;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rollout::{
    cartpole::{
        CartPole, CartPoleAct, CartPoleConfig, CartPoleObs, MultiCartPole, MultiCartPoleConfig,
    },
    core::{
        record::{BufferedRecorder, RecordStorage, RecordValue},
        AgentId, Env, MultiAgentEnv, PolicyId, PolicyMap, Rollout, RolloutConfig, SingleAgent,
    },
    policy::{ActionHead, Mlp, MlpPolicy, OutputActivation, Rnn, RnnPolicy},
};
use std::path::PathBuf;

const DIM_OBS: usize = 4;
const DIM_ACT: usize = 2;
const DIM_HIDDEN: usize = 16;

/// Roll out a policy on cart-pole
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Rollout configuration in YAML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Environment configuration in YAML
    #[arg(long)]
    env_config: Option<PathBuf>,

    /// Policy in bincode format, a randomly initialized policy if omitted
    #[arg(long)]
    policy: Option<PathBuf>,

    /// The policy is recurrent
    #[arg(long, default_value_t = false)]
    recurrent: bool,

    /// Number of environment steps to roll out, 0 for no budget
    #[arg(long)]
    steps: Option<usize>,

    /// Maximum number of episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Do not render the environment
    #[arg(long, default_value_t = false)]
    no_render: bool,

    /// Frame rate of rendering
    #[arg(long)]
    fps: Option<f32>,

    /// Number of frames each action is repeated for
    #[arg(long)]
    frame_skip: Option<usize>,

    /// Number of carts, each controlled by its own agent
    #[arg(long, default_value_t = 1)]
    agents: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: i64,

    /// Map agents randomly to one of two copies of the policy in every episode
    #[arg(long, default_value_t = false)]
    stochastic_mapping: bool,
}

fn rollout_config(args: &Args) -> Result<RolloutConfig> {
    let mut config = match &args.config {
        Some(path) => RolloutConfig::load(path)?,
        None => RolloutConfig::default(),
    };
    config = config.render(!args.no_render);
    if let Some(steps) = args.steps {
        config = config.max_steps(steps);
    }
    if let Some(fps) = args.fps {
        config = config.fps(fps);
    }
    if let Some(frame_skip) = args.frame_skip {
        config = config.frame_skip(frame_skip);
    }
    if args.episodes.is_some() {
        config = config.max_episodes(args.episodes);
    }
    Ok(config)
}

fn env_config(args: &Args) -> Result<CartPoleConfig> {
    match &args.env_config {
        Some(path) => CartPoleConfig::load(path),
        None => Ok(CartPoleConfig::default()),
    }
}

fn add_policy<E>(policies: PolicyMap<E>, id: &str, args: &Args, seed: u64) -> Result<PolicyMap<E>>
where
    E: MultiAgentEnv<Obs = CartPoleObs, Act = CartPoleAct> + 'static,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let policies = match (&args.policy, args.recurrent) {
        (Some(path), false) => {
            policies.with(id, MlpPolicy::from_serialized_path(path)?.seed(seed))
        }
        (Some(path), true) => {
            policies.with(id, RnnPolicy::from_serialized_path(path)?.seed(seed))
        }
        (None, false) => {
            info!("No policy given, using a random MLP policy");
            let dims = [DIM_OBS, DIM_HIDDEN, DIM_ACT];
            let mlp = Mlp::random(&dims, OutputActivation::Identity, &mut rng);
            policies.with(id, MlpPolicy::new(mlp, ActionHead::Discrete).seed(seed))
        }
        (None, true) => {
            info!("No policy given, using a random recurrent policy");
            let rnn = Rnn::random(DIM_OBS, DIM_HIDDEN, &mut rng);
            let mlp = Mlp::random(&[DIM_HIDDEN, DIM_ACT], OutputActivation::Identity, &mut rng);
            policies.with(id, RnnPolicy::new(rnn, mlp, ActionHead::Discrete)?.seed(seed))
        }
    };
    Ok(policies)
}

fn run<E>(env: E, args: &Args) -> Result<()>
where
    E: MultiAgentEnv<Obs = CartPoleObs, Act = CartPoleAct> + 'static,
{
    let config = rollout_config(args)?;
    let seed = args.seed as u64;
    let mut recorder = BufferedRecorder::new();

    let episodes = if args.stochastic_mapping {
        let ids = [PolicyId::new("policy_0"), PolicyId::new("policy_1")];
        let policies = add_policy(PolicyMap::new(), ids[0].as_str(), args, seed)?;
        let policies = add_policy(policies, ids[1].as_str(), args, seed)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mapping = move |_: &AgentId| ids[rng.gen_range(0..ids.len())].clone();
        Rollout::new(env, policies, config)?
            .with_mapping(mapping)
            .run(&mut recorder)?
    } else {
        let id = PolicyId::default_policy();
        let policies = add_policy(PolicyMap::new(), id.as_str(), args, seed)?;
        Rollout::new(env, policies, config)?.run(&mut recorder)?
    };

    let mut storage = RecordStorage::new();
    recorder
        .into_records()
        .into_iter()
        .for_each(|r| storage.store(r));
    let summary = storage.aggregate()?;
    let mut keys: Vec<_> = summary.keys().cloned().collect();
    keys.sort();
    println!("Summary of {} episodes", episodes.len());
    for key in keys.iter() {
        if let Some(RecordValue::Scalar(v)) = summary.get(key) {
            println!("  {}: {}", key, v);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let env_config = env_config(&args)?;

    match args.agents {
        0 | 1 => run(SingleAgent::new(CartPole::build(&env_config, args.seed)?), &args),
        n => {
            let config = MultiCartPoleConfig::new(env_config, n);
            run(MultiCartPole::build(&config, args.seed)?, &args)
        }
    }
}
