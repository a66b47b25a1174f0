use anyhow::{Context, Result};
use api_mdp::algos::model_free::dense_policy;
use api_mdp::rollout::run_policy;
use api_mdp::*;
use clap::{Parser, ValueEnum};
use ndarray::{Array1, Array2};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Values of the uniform random policy.
    Evaluate,
    PolicyIteration,
    ValueIteration,
    MonteCarlo,
    Sarsa,
    QLearning,
}

/// Solve the networked-service MDP and roll out the learned policy.
#[derive(Debug, Parser)]
#[command(name = "api-mdp", version)]
struct Cli {
    #[arg(value_enum)]
    algorithm: Algorithm,

    /// JSON environment configuration; the reference one when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 0.9)]
    gamma: f64,

    #[arg(long, default_value_t = 1e-6)]
    theta: f64,

    /// Cap on value-iteration sweeps or policy-iteration rounds.
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Cap on the sweeps of each policy evaluation.
    #[arg(long)]
    max_sweeps: Option<usize>,

    #[arg(long, default_value_t = 1000)]
    episodes: usize,

    #[arg(long, default_value_t = 0.1)]
    alpha: f64,

    #[arg(long, default_value_t = 0.1)]
    epsilon: f64,

    #[arg(long, default_value_t = 0.99)]
    epsilon_decay: f64,

    #[arg(long, default_value_t = 10)]
    eval_episodes: usize,

    /// Step cap for training and evaluation episodes.
    #[arg(long, default_value_t = 100)]
    max_steps: usize,

    /// Print the evaluation rollout as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EnvConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EnvConfig::default(),
    };
    let mut env = ApiEnv::new(&config, cli.seed)?;
    info!(algorithm = ?cli.algorithm, "solving");

    let (policy, values) = match cli.algorithm {
        Algorithm::Evaluate => {
            let p = 1. / Action::COUNT as f64;
            let uniform = Array2::from_elem((State::COUNT, Action::COUNT), p);
            let e = policy_evaluation(&env, &uniform, cli.gamma, cli.theta, cli.max_sweeps)?;
            info!(sweeps = e.sweeps, "uniform policy evaluated");
            print_values(&e.v);
            return Ok(());
        }
        Algorithm::PolicyIteration => {
            let s = policy_iteration(
                &env,
                cli.gamma,
                cli.theta,
                cli.max_iterations,
                cli.max_sweeps,
            )?;
            info!(rounds = s.iterations, "policy iteration done");
            (s.policy, s.v)
        }
        Algorithm::ValueIteration => {
            let s = value_iteration(&env, cli.gamma, cli.theta, cli.max_iterations)?;
            info!(sweeps = s.iterations, "value iteration done");
            (s.policy, s.v)
        }
        Algorithm::MonteCarlo => sampled(mc_control_epsilon_greedy(
            &mut env,
            &McControlParams {
                gamma: cli.gamma,
                epsilon: cli.epsilon,
                n_episodes: cli.episodes,
                max_steps: Some(cli.max_steps),
                seed: cli.seed,
            },
        )?),
        Algorithm::Sarsa => sampled(sarsa(
            &mut env,
            &SarsaParams {
                gamma: cli.gamma,
                alpha: cli.alpha,
                epsilon: cli.epsilon,
                n_episodes: cli.episodes,
                max_steps: Some(cli.max_steps),
                seed: cli.seed,
            },
        )?),
        Algorithm::QLearning => sampled(q_learning(
            &mut env,
            &QLearningParams {
                gamma: cli.gamma,
                alpha: cli.alpha,
                epsilon: cli.epsilon,
                epsilon_decay: cli.epsilon_decay,
                n_episodes: cli.episodes,
                max_steps: Some(cli.max_steps),
                seed: cli.seed,
            },
        )?),
    };

    print_policy(&policy, &values);

    let rollout = run_policy(&mut env, &policy, cli.eval_episodes, cli.max_steps)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&rollout)?);
    }
    println!(
        "Episodes: {}, reached goal: {}, mean reward: {:.2}",
        cli.eval_episodes,
        rollout.completed(),
        rollout.mean_reward()
    );
    println!("{:?}", rollout.total_rewards);

    Ok(())
}

/// Dense greedy policy plus the best action value of every state.
fn sampled(solution: SampledSolution) -> (Array2<f64>, Array1<f64>) {
    let policy = dense_policy(&solution.policy, State::COUNT, Action::COUNT);
    let values = (0..State::COUNT).map(|s| solution.q.max_value(s)).collect();
    (policy, values)
}

fn print_values(v: &Array1<f64>) {
    for state in State::all() {
        println!("{:<32} {:>10.3}", state.label(), v[state.index()]);
    }
}

fn print_policy(policy: &Array2<f64>, v: &Array1<f64>) {
    for state in State::all() {
        let s = state.index();
        let action = policy
            .policy(&s)
            .and_then(Action::from_index)
            .map_or("-", |a| a.label());
        println!("{:<32} {:<24} {:>10.3}", state.label(), action, v[s]);
    }
}
