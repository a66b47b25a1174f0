use super::common::{check_theta, check_transitions, one_step_lookahead, q_value, Convergence};
use super::pe::evaluate;
use super::{DpSolution, Mdp, MdpSolver};
use crate::common::{defs::*, utils::*};
use crate::error::{check_gamma, Result};
use ndarray::{Array1, Array2};
use std::rc::Rc;
use tracing::{debug, info};

/// Policy iteration - Sutton & Barto 2018, 4.3.
///
/// Starts from the uniform random policy. Each round evaluates the current
/// policy in place, then makes it greedy with respect to the new values.
/// It stops once every row already is the one-hot greedy choice, so the
/// values always belong to the returned policy.
#[derive(Clone)]
pub struct PolicyIteration {
    transitions: Rc<Transitions>,
    n_s: usize,
    n_a: usize,
    gamma: Continous,
    max_sweeps: Option<usize>,
    v: Array1<Continous>,
    pi: Array2<Continous>,
}

impl PolicyIteration {
    pub fn new(mdp: &dyn Mdp, gamma: Continous) -> Result<Self> {
        check_gamma(gamma)?;
        let (n_s, n_a) = (mdp.n_s(), mdp.n_a());
        let transitions = mdp.transitions();
        check_transitions(n_s, n_a, &transitions)?;

        Ok(Self {
            transitions,
            n_s,
            n_a,
            gamma,
            max_sweeps: None,
            v: Array1::zeros(n_s),
            pi: Array2::from_elem((n_s, n_a), 1. / n_a as Continous),
        })
    }

    /// Caps the sweeps of each evaluation. Rounds are capped by `exec`.
    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn policy(&self) -> &Array2<Continous> {
        &self.pi
    }

    pub fn values(&self) -> &Array1<Continous> {
        &self.v
    }

    pub fn into_solution(self, iterations: usize) -> DpSolution {
        DpSolution {
            policy: self.pi,
            v: self.v,
            iterations,
        }
    }

    /// Greedy improvement. Returns whether every row already was the one-hot
    /// greedy choice, and the largest value gap between the old and the new
    /// action.
    fn improve(&mut self) -> (bool, Continous) {
        let mut stable = true;
        let mut gap: Continous = 0.;
        for s in 0..self.n_s {
            let chosen = argmax(self.pi.row(s).iter().copied());
            let q = one_step_lookahead(&self.transitions, self.n_a, s, &self.v, self.gamma);
            let best = argmax(q.iter().copied());
            let greedy = one_hot(self.n_a, best);

            if chosen != best {
                gap = gap.max(q[best] - q[chosen]);
            }
            // A stochastic row with the right argmax still changes.
            if self.pi.row(s) != greedy {
                stable = false;
                self.pi.row_mut(s).assign(&greedy);
            }
        }

        (stable, gap)
    }
}

impl MdpSolver for PolicyIteration {
    fn v_star(&self, s: Discrete) -> Option<Continous> {
        self.v.get(s).copied()
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous> {
        self.transitions
            .get(&(s, a))
            .map(|ts| q_value(ts, &self.v, self.gamma))
    }

    fn pi_star(&self, s: Discrete) -> Option<Discrete> {
        self.pi.policy(&s)
    }

    /// `num_iterations` caps the improvement rounds. Evaluation sweeps are
    /// capped by [`PolicyIteration::with_max_sweeps`].
    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> Result<Convergence> {
        check_theta(theta)?;

        let mut rounds = 0;
        loop {
            rounds += 1;
            let eval = evaluate(
                &self.transitions,
                &self.pi,
                &mut self.v,
                self.gamma,
                theta,
                self.max_sweeps,
            );
            if let Convergence::Exhausted { iterations, delta } = eval {
                return Ok(Convergence::EvaluationExhausted {
                    round: rounds,
                    sweeps: iterations,
                    delta,
                });
            }

            let (stable, gap) = self.improve();
            debug!(rounds, sweeps = eval.iterations(), stable, gap, "policy improvement");

            if stable {
                info!(rounds, "policy iteration converged");
                return Ok(Convergence::Converged { iterations: rounds });
            }

            if num_iterations.is_some_and(|m| rounds >= m) {
                return Ok(Convergence::Exhausted {
                    iterations: rounds,
                    delta: gap,
                });
            }
        }
    }
}

/// Runs [`PolicyIteration`] to a stable policy. `max_rounds` caps the
/// improvement rounds and `max_sweeps` each evaluation inside them.
pub fn policy_iteration(
    mdp: &dyn Mdp,
    gamma: Continous,
    theta: Continous,
    max_rounds: Option<usize>,
    max_sweeps: Option<usize>,
) -> Result<DpSolution> {
    let mut solver = PolicyIteration::new(mdp, gamma)?.with_max_sweeps(max_sweeps);
    let iterations = solver
        .exec(theta, max_rounds)?
        .into_result("policy iteration")?;

    Ok(solver.into_solution(iterations))
}
