use super::common::{check_theta, check_transitions, q_value, Convergence};
use super::Mdp;
use crate::common::defs::*;
use crate::error::{check_gamma, MdpError, Result};
use ndarray::{Array1, Array2};
use tracing::{debug, trace};

/// Value function of a fixed policy.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub v: Array1<Continous>,
    pub sweeps: usize,
}

/// One in-place sweep over all states. Returns the largest change.
pub(crate) fn sweep(
    transitions: &Transitions,
    policy: &Array2<Continous>,
    v: &mut Array1<Continous>,
    gamma: Continous,
) -> Continous {
    let mut delta: Continous = 0.;
    for s in 0..policy.nrows() {
        let new_v = policy
            .row(s)
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > 0.)
            .map(|(a, &p)| {
                p * transitions
                    .get(&(s, a))
                    .map_or(0., |ts| q_value(ts, v, gamma))
            })
            .sum::<Continous>();

        delta = delta.max((new_v - v[s]).abs());
        v[s] = new_v;
    }

    delta
}

/// Sweeps `v` in place until the largest change drops below `theta`.
pub(crate) fn evaluate(
    transitions: &Transitions,
    policy: &Array2<Continous>,
    v: &mut Array1<Continous>,
    gamma: Continous,
    theta: Continous,
    max_sweeps: Option<usize>,
) -> Convergence {
    let mut sweeps = 0;
    loop {
        let delta = sweep(transitions, policy, v, gamma);
        sweeps += 1;
        trace!(sweeps, delta, "evaluation sweep");

        if delta < theta {
            return Convergence::Converged { iterations: sweeps };
        }

        if max_sweeps.is_some_and(|m| sweeps >= m) {
            return Convergence::Exhausted {
                iterations: sweeps,
                delta,
            };
        }
    }
}

fn check_policy(policy: &Array2<Continous>, n_s: usize, n_a: usize) -> Result<()> {
    let (rows, cols) = policy.dim();
    if (rows, cols) != (n_s, n_a) {
        return Err(MdpError::PolicyShape {
            rows,
            cols,
            n_s,
            n_a,
        });
    }

    for (s, row) in policy.outer_iter().enumerate() {
        let sum = row.sum();
        if row.iter().any(|&p| p < 0.) || (sum - 1.).abs() > 1e-6 {
            return Err(MdpError::InvalidParameter(format!(
                "policy row {s} is not a distribution (sum {sum})"
            )));
        }
    }

    Ok(())
}

/// Iterative policy evaluation. Fails with [`MdpError::NotConverged`] when
/// `max_sweeps` runs out first.
pub fn policy_evaluation(
    mdp: &dyn Mdp,
    policy: &Array2<Continous>,
    gamma: Continous,
    theta: Continous,
    max_sweeps: Option<usize>,
) -> Result<Evaluation> {
    check_gamma(gamma)?;
    check_theta(theta)?;
    check_policy(policy, mdp.n_s(), mdp.n_a())?;
    let transitions = mdp.transitions();
    check_transitions(mdp.n_s(), mdp.n_a(), &transitions)?;

    let mut v = Array1::zeros(mdp.n_s());
    let sweeps = evaluate(&transitions, policy, &mut v, gamma, theta, max_sweeps)
        .into_result("policy evaluation")?;
    debug!(sweeps, "policy evaluated");

    Ok(Evaluation { v, sweeps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::fixtures::simple_golf;
    use crate::envs::tabular::TabularMdp;
    use float_eq::*;
    use ndarray::array;

    fn single_state(reward: Continous) -> TabularMdp {
        let ts = Transitions::from([(
            (0, 0),
            vec![Transition {
                next_state: 0,
                probability: 1.,
                reward,
                done: false,
            }],
        )]);
        TabularMdp::new("loop", 1, 1, ts, 0, 0).unwrap()
    }

    #[test]
    fn test_self_loop_is_geometric_sum() {
        let e = policy_evaluation(&single_state(2.), &array![[1.]], 0.9, 1e-10, None).unwrap();

        assert_float_eq!(e.v[0], 20., abs <= 1e-6);
    }

    #[test]
    fn test_zero_rewards_give_zero_values() {
        let pi = Array2::from_elem((3, 3), 1. / 3.);
        let mdp = simple_golf();
        let transitions = mdp.transitions();
        let zeroed = transitions
            .iter()
            .map(|(k, ts)| {
                let ts = ts
                    .iter()
                    .map(|t| Transition {
                        reward: 0.,
                        ..t.clone()
                    })
                    .collect();
                (*k, ts)
            })
            .collect::<Transitions>();
        let mdp = TabularMdp::new("quiet golf", 3, 3, zeroed, 0, 0).unwrap();

        let e = policy_evaluation(&mdp, &pi, 0.9, 1e-8, None).unwrap();
        assert_float_eq!(e.v.to_vec(), vec![0.; 3], abs_all <= 1e-12);
    }

    #[test]
    fn test_golf_putting_policy() {
        // Fairway: hit to green. Green: hit in hole.
        let pi = array![[1., 0., 0.], [0., 0., 1.], [1., 0., 0.]];
        let e = policy_evaluation(&simple_golf(), &pi, 0.9, 1e-10, None).unwrap();

        // v1 = 0.9 * 10 + 0.1 * 0.9 * v1; v0 = 0.9 * 0.9 * v1 + 0.1 * 0.9 * v0.
        let v1 = 9. / (1. - 0.09);
        let v0 = 0.81 * v1 / (1. - 0.09);
        assert_float_eq!(e.v.to_vec(), vec![v0, v1, 0.], abs_all <= 1e-6);
    }

    #[test]
    fn test_sweep_cap_reports_not_converged() {
        let r = policy_evaluation(&single_state(1.), &array![[1.]], 0.99, 1e-12, Some(5));

        assert!(matches!(
            r,
            Err(MdpError::NotConverged { iterations: 5, .. })
        ));
    }

    #[test]
    fn test_bad_policy_shape() {
        let r = policy_evaluation(&simple_golf(), &array![[1., 0.]], 0.9, 1e-6, None);

        assert!(matches!(r, Err(MdpError::PolicyShape { rows: 1, cols: 2, .. })));
    }

    #[test]
    fn test_bad_gamma() {
        let r = policy_evaluation(&single_state(1.), &array![[1.]], 0., 1e-6, None);

        assert!(matches!(r, Err(MdpError::InvalidParameter(_))));
    }
}
