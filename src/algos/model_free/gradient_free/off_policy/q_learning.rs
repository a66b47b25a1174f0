use super::super::log_progress;
use crate::algos::model_free::{
    check_alpha, check_sampling, make_rng, MdpSimulator, QTable, SampledSolution,
};
use crate::common::defs::*;
use crate::error::{check_unit, Result};
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct QLearningParams {
    pub gamma: Continous,
    pub alpha: Continous,
    /// Starting exploration rate.
    pub epsilon: Continous,
    /// Multiplies ε after every episode; 1 keeps it fixed.
    pub epsilon_decay: Continous,
    pub n_episodes: usize,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for QLearningParams {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            alpha: 0.1,
            epsilon: 0.1,
            epsilon_decay: 0.99,
            n_episodes: 1000,
            max_steps: None,
            seed: None,
        }
    }
}

/// Off-policy TD control - Sutton & Barto 2018, 6.5.
pub fn q_learning(
    env: &mut dyn MdpSimulator,
    params: &QLearningParams,
) -> Result<SampledSolution> {
    check_sampling(params.gamma, params.epsilon, params.n_episodes)?;
    check_alpha(params.alpha)?;
    check_unit("epsilon decay", params.epsilon_decay)?;

    let mut rng = make_rng(params.seed);
    let mut q = QTable::new(env.n_a());
    let mut episode_rewards = Vec::with_capacity(params.n_episodes);
    let mut epsilon = params.epsilon;

    for i in 1..=params.n_episodes {
        let mut s = env.reset();
        let mut total = 0.;
        let mut steps = 0;

        loop {
            let a = q.explore(&mut rng, s, epsilon);
            let si = env.step(a)?;
            total += si.reward;
            steps += 1;

            let target = si.reward + params.gamma * q.max_value(si.next_state);
            let q_sa = q.value(s, a);
            q.row_mut(s)[a] = q_sa + params.alpha * (target - q_sa);

            s = si.next_state;
            if si.done || params.max_steps.is_some_and(|m| steps >= m) {
                break;
            }
        }

        episode_rewards.push(total);
        epsilon *= params.epsilon_decay;
        log_progress("q-learning", i, params.n_episodes, total);
    }

    info!(env = %env.name(), states = q.len(), epsilon, "q-learning done");
    Ok(SampledSolution {
        policy: q.greedy_policy(),
        q,
        episode_rewards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algos::model_based::mdp::vi::value_iteration;
    use crate::envs::fixtures::{bandit, chain};
    use crate::error::MdpError;
    use float_eq::*;

    #[test]
    fn test_learns_same_greedy_actions_as_value_iteration() {
        let params = QLearningParams {
            gamma: 0.9,
            alpha: 0.5,
            epsilon: 0.3,
            n_episodes: 500,
            max_steps: Some(100),
            seed: Some(42),
            ..Default::default()
        };

        let solution = q_learning(&mut chain(), &params).unwrap();
        let dp = value_iteration(&chain(), 0.9, 1e-10, None).unwrap();

        for s in 0..2 {
            assert_eq!(solution.policy.policy(&s), dp.policy.policy(&s));
        }
        // Deterministic chain: the greedy targets reach the optimal values.
        assert_float_eq!(solution.q.value(1, 1), 10., abs <= 1e-3);
        assert_float_eq!(solution.q.value(0, 1), 8., abs <= 1e-2);
    }

    #[test]
    fn test_without_exploration_only_first_action_is_tried() {
        let params = QLearningParams {
            epsilon: 0.,
            n_episodes: 10,
            seed: Some(1),
            ..Default::default()
        };

        let solution = q_learning(&mut bandit(), &params).unwrap();
        // Ties go to action 0 and its value never drops below zero.
        assert_eq!(solution.q.value(0, 1), 0.);
        assert_eq!(solution.policy.policy(&0), Some(0));
    }

    #[test]
    fn test_invalid_decay() {
        let params = QLearningParams {
            epsilon_decay: 1.5,
            ..Default::default()
        };

        assert!(matches!(
            q_learning(&mut chain(), &params),
            Err(MdpError::InvalidParameter(_))
        ));
    }
}
