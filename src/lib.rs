pub mod algos;
pub mod common;
pub mod config;
pub mod envs;
pub mod error;
pub mod rollout;

pub use algos::model_based::mdp::{
    common::Convergence,
    pe::{policy_evaluation, Evaluation},
    pi::{policy_iteration, PolicyIteration},
    vi::{value_iteration, ValueIteration},
    DpSolution, Mdp, MdpSolver, MdpSolverPolicy,
};
pub use algos::model_free::{
    gradient_free::{
        off_policy::q_learning::{q_learning, QLearningParams},
        on_policy::{
            monte_carlo::{mc_control_epsilon_greedy, McControlParams},
            sarsa::{sarsa, SarsaParams},
        },
    },
    MdpSimulator, QTable, SampledSolution, StatePolicy,
};
pub use common::defs::*;
pub use config::EnvConfig;
pub use envs::{
    api::{Action, ApiEnv, Availability, Capacity, Health, Speed, State},
    tabular::TabularMdp,
};
pub use error::{MdpError, Result};
