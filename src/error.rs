use crate::common::defs::Discrete;
use rand::distributions::WeightedError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MdpError>;

#[derive(Debug, Error)]
pub enum MdpError {
    #[error("missing {factor} reward for '{label}'")]
    MissingReward { factor: &'static str, label: String },

    #[error("missing penalty for action '{0}'")]
    MissingPenalty(String),

    #[error("invalid probability range '{name}': [{low}, {high}]")]
    InvalidRange { name: String, low: f64, high: f64 },

    #[error("transition distribution for (s={state}, a={action}) sums to {sum}")]
    InvalidDistribution {
        state: Discrete,
        action: Discrete,
        sum: f64,
    },

    #[error("probability {probability} for (s={state}, a={action}) is outside [0, 1]")]
    InvalidProbability {
        state: Discrete,
        action: Discrete,
        probability: f64,
    },

    #[error("no transitions for (s={state}, a={action})")]
    MissingTransition { state: Discrete, action: Discrete },

    #[error("unknown state label '{0}'")]
    UnknownState(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("state index {state} out of range (n_s = {n_s})")]
    StateOutOfRange { state: Discrete, n_s: usize },

    #[error("action index {action} out of range (n_a = {n_a})")]
    ActionOutOfRange { action: Discrete, n_a: usize },

    #[error("step called before reset")]
    NotReset,

    #[error("policy has shape {rows}x{cols}, expected {n_s}x{n_a}")]
    PolicyShape {
        rows: usize,
        cols: usize,
        n_s: usize,
        n_a: usize,
    },

    #[error("invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error("{solver} did not converge after {iterations} iterations (delta = {delta})")]
    NotConverged {
        solver: &'static str,
        iterations: usize,
        delta: f64,
    },

    #[error("{solver}: evaluation in round {round} stopped after {sweeps} sweeps (delta = {delta})")]
    EvaluationNotConverged {
        solver: &'static str,
        round: usize,
        sweeps: usize,
        delta: f64,
    },

    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cannot sample next state: {0}")]
    Sampling(#[from] WeightedError),
}

/// Rejects a discount factor outside (0, 1].
pub(crate) fn check_gamma(gamma: f64) -> Result<()> {
    if gamma > 0. && gamma <= 1. {
        Ok(())
    } else {
        Err(MdpError::InvalidParameter(format!(
            "discount factor {gamma} not in (0, 1]"
        )))
    }
}

pub(crate) fn check_unit(name: &str, x: f64) -> Result<()> {
    if (0. ..=1.).contains(&x) {
        Ok(())
    } else {
        Err(MdpError::InvalidParameter(format!("{name} {x} not in [0, 1]")))
    }
}
