use crate::common::defs::*;
use crate::common::utils::{argmax, check_distribution, one_hot};
use crate::error::{MdpError, Result};
use ndarray::{Array1, Array2};
use tracing::warn;

/// How an iterative solver stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
    Converged { iterations: usize },
    /// The iteration cap was hit; `delta` is the last measured change.
    Exhausted { iterations: usize, delta: Continous },
    /// An inner policy evaluation ran out of sweeps during outer `round`.
    EvaluationExhausted {
        round: usize,
        sweeps: usize,
        delta: Continous,
    },
}

impl Convergence {
    pub fn iterations(&self) -> usize {
        match self {
            Convergence::Converged { iterations } | Convergence::Exhausted { iterations, .. } => {
                *iterations
            }
            Convergence::EvaluationExhausted { round, .. } => *round,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    /// Turns an exhausted run into [`MdpError::NotConverged`].
    pub fn into_result(self, solver: &'static str) -> Result<usize> {
        match self {
            Convergence::Converged { iterations } => Ok(iterations),
            Convergence::Exhausted { iterations, delta } => {
                warn!(solver, iterations, delta, "iteration cap exhausted");
                Err(MdpError::NotConverged {
                    solver,
                    iterations,
                    delta,
                })
            }
            Convergence::EvaluationExhausted {
                round,
                sweeps,
                delta,
            } => {
                warn!(solver, round, sweeps, delta, "evaluation sweep cap exhausted");
                Err(MdpError::EvaluationNotConverged {
                    solver,
                    round,
                    sweeps,
                    delta,
                })
            }
        }
    }
}

pub fn check_theta(theta: Continous) -> Result<()> {
    if theta > 0. {
        Ok(())
    } else {
        Err(MdpError::InvalidParameter(format!(
            "convergence threshold {theta} must be positive"
        )))
    }
}

/// Every (state, action) pair has a valid distribution over known states.
pub fn check_transitions(n_s: usize, n_a: usize, transitions: &Transitions) -> Result<()> {
    for s in 0..n_s {
        for a in 0..n_a {
            let ts = transitions
                .get(&(s, a))
                .ok_or(MdpError::MissingTransition { state: s, action: a })?;

            if let Some(t) = ts.iter().find(|t| t.next_state >= n_s) {
                return Err(MdpError::StateOutOfRange {
                    state: t.next_state,
                    n_s,
                });
            }

            check_distribution(s, a, ts)?;
        }
    }

    Ok(())
}

/// Σ p · (r + γ·v[s']) over one outcome list.
pub fn q_value(ts: &[Transition], v: &Array1<Continous>, gamma: Continous) -> Continous {
    ts.iter()
        .map(|t| t.probability * (t.reward + gamma * v[t.next_state]))
        .sum()
}

/// Action values of `s` under `v`. Assumes a table that passed [`check_transitions`].
pub fn one_step_lookahead(
    transitions: &Transitions,
    n_a: usize,
    s: Discrete,
    v: &Array1<Continous>,
    gamma: Continous,
) -> Array1<Continous> {
    (0..n_a)
        .map(|a| {
            transitions
                .get(&(s, a))
                .map_or(0., |ts| q_value(ts, v, gamma))
        })
        .collect()
}

/// One-hot policy picking the best lookahead action in every state.
pub fn greedy_policy(
    transitions: &Transitions,
    n_s: usize,
    n_a: usize,
    v: &Array1<Continous>,
    gamma: Continous,
) -> Array2<Continous> {
    let mut pi = Array2::zeros((n_s, n_a));
    for s in 0..n_s {
        let q = one_step_lookahead(transitions, n_a, s, v, gamma);
        pi.row_mut(s).assign(&one_hot(n_a, argmax(q.iter().copied())));
    }

    pi
}
