use super::common::{
    check_theta, check_transitions, greedy_policy, one_step_lookahead, q_value, Convergence,
};
use super::{DpSolution, Mdp, MdpSolver};
use crate::common::defs::*;
use crate::error::{check_gamma, Result};
use ndarray::{Array1, Array2};
use std::rc::Rc;
use tracing::{debug, info};

/// Value iteration - Sutton & Barto 2018, 4.4.
#[derive(Clone)]
pub struct ValueIteration {
    transitions: Rc<Transitions>,
    n_s: usize,
    n_a: usize,
    gamma: Continous,
    v: Array1<Continous>,
    pi: Array2<Continous>,
}

impl ValueIteration {
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
            v: Array1::zeros(n_s),
            pi: Array2::zeros((n_s, n_a)),
        })
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

    fn sweep(&mut self) -> Continous {
        let mut delta: Continous = 0.;
        for s in 0..self.n_s {
            let best = one_step_lookahead(&self.transitions, self.n_a, s, &self.v, self.gamma)
                .fold(Continous::NEG_INFINITY, |acc, &q| acc.max(q));
            delta = delta.max((best - self.v[s]).abs());
            self.v[s] = best;
        }

        delta
    }
}

impl MdpSolver for ValueIteration {
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

    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> Result<Convergence> {
        check_theta(theta)?;

        let mut sweeps = 0;
        let convergence = loop {
            let delta = self.sweep();
            sweeps += 1;
            debug!(sweeps, delta, "value sweep");

            if delta < theta {
                info!(sweeps, "value iteration converged");
                break Convergence::Converged { iterations: sweeps };
            }

            if num_iterations.is_some_and(|m| sweeps >= m) {
                break Convergence::Exhausted {
                    iterations: sweeps,
                    delta,
                };
            }
        };

        self.pi = greedy_policy(&self.transitions, self.n_s, self.n_a, &self.v, self.gamma);
        Ok(convergence)
    }
}

/// Runs [`ValueIteration`] and extracts the greedy policy.
pub fn value_iteration(
    mdp: &dyn Mdp,
    gamma: Continous,
    theta: Continous,
    max_iterations: Option<usize>,
) -> Result<DpSolution> {
    let mut solver = ValueIteration::new(mdp, gamma)?;
    let iterations = solver
        .exec(theta, max_iterations)?
        .into_result("value iteration")?;

    Ok(solver.into_solution(iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::fixtures::simple_golf;
    use crate::envs::tabular::TabularMdp;
    use crate::error::MdpError;
    use float_eq::*;
    use rstest::rstest;

    #[test]
    fn test_golf() {
        let solution = value_iteration(&simple_golf(), 0.9, 1e-10, None).unwrap();

        assert_float_eq!(
            solution.v.to_vec(),
            vec![8.8033, 9.8901, 0.0],
            abs_all <= 1e-4
        );
        assert_eq!(
            (0..3)
                .map(|s| solution.policy.policy(&s).unwrap())
                .collect::<Vec<_>>(),
            vec![0, 2, 0]
        );
    }

    #[rstest]
    #[case(0.5, 2.)]
    #[case(0.9, 10.)]
    #[case(0.99, 100.)]
    fn test_best_self_loop(#[case] gamma: Continous, #[case] expected: Continous) {
        // Action 1 pays 1 per step, action 0 pays nothing.
        let t = |reward| Transition {
            next_state: 0,
            probability: 1.,
            reward,
            done: false,
        };
        let ts = Transitions::from([((0, 0), vec![t(0.)]), ((0, 1), vec![t(1.)])]);
        let mdp = TabularMdp::new("loop", 1, 2, ts, 0, 0).unwrap();

        let solution = value_iteration(&mdp, gamma, 1e-10, None).unwrap();
        assert_float_eq!(solution.v[0], expected, abs <= 1e-6);
        assert_eq!(solution.policy.policy(&0), Some(1));
    }

    #[test]
    fn test_sweep_cap() {
        let mdp = simple_golf();
        let mut vi = ValueIteration::new(&mdp, 0.9).unwrap();
        let c = vi.exec(1e-10, Some(2)).unwrap();

        assert!(!c.is_converged());
        assert_eq!(c.iterations(), 2);
        // The greedy policy is still extracted from the partial values.
        assert_eq!(vi.pi_star(1), Some(2));
        assert!(matches!(
            c.into_result("value iteration"),
            Err(MdpError::NotConverged { iterations: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_gamma_and_theta() {
        let mdp = simple_golf();
        assert!(ValueIteration::new(&mdp, 1.5).is_err());
        assert!(value_iteration(&mdp, 0.9, -1., None).is_err());
    }
}
