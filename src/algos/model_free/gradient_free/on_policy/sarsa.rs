use super::super::log_progress;
use crate::algos::model_free::{
    check_alpha, check_sampling, make_rng, MdpSimulator, QTable, SampledSolution,
};
use crate::common::defs::*;
use crate::error::Result;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct SarsaParams {
    pub gamma: Continous,
    pub alpha: Continous,
    pub epsilon: Continous,
    pub n_episodes: usize,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for SarsaParams {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            alpha: 0.5,
            epsilon: 0.1,
            n_episodes: 1000,
            max_steps: None,
            seed: None,
        }
    }
}

/// On-policy TD control - Sutton & Barto 2018, 6.4.
pub fn sarsa(env: &mut dyn MdpSimulator, params: &SarsaParams) -> Result<SampledSolution> {
    check_sampling(params.gamma, params.epsilon, params.n_episodes)?;
    check_alpha(params.alpha)?;

    let mut rng = make_rng(params.seed);
    let mut q = QTable::new(env.n_a());
    let mut episode_rewards = Vec::with_capacity(params.n_episodes);

    for i in 1..=params.n_episodes {
        let mut s = env.reset();
        let mut a = q.explore(&mut rng, s, params.epsilon);
        let mut total = 0.;
        let mut steps = 0;

        loop {
            let si = env.step(a)?;
            let next_a = q.explore(&mut rng, si.next_state, params.epsilon);
            total += si.reward;
            steps += 1;

            // Nothing is ever learned for a terminal state, so its values stay zero.
            let target = si.reward + params.gamma * q.value(si.next_state, next_a);
            let q_sa = q.value(s, a);
            q.row_mut(s)[a] = q_sa + params.alpha * (target - q_sa);

            if si.done || params.max_steps.is_some_and(|m| steps >= m) {
                break;
            }

            (s, a) = (si.next_state, next_a);
        }

        episode_rewards.push(total);
        log_progress("sarsa", i, params.n_episodes, total);
    }

    info!(env = %env.name(), states = q.len(), "sarsa done");
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
    use crate::envs::fixtures::chain;
    use crate::error::MdpError;

    #[test]
    fn test_learns_same_greedy_actions_as_value_iteration() {
        let params = SarsaParams {
            gamma: 0.9,
            alpha: 0.5,
            epsilon: 0.1,
            n_episodes: 500,
            max_steps: Some(100),
            seed: Some(42),
        };

        let solution = sarsa(&mut chain(), &params).unwrap();
        let dp = value_iteration(&chain(), 0.9, 1e-10, None).unwrap();

        for s in 0..2 {
            assert_eq!(solution.policy.policy(&s), dp.policy.policy(&s));
            assert_eq!(solution.policy.policy(&s), Some(1));
        }
        assert!(solution.q.value(1, 1) > solution.q.value(1, 0));
        assert_eq!(solution.episode_rewards.len(), 500);
    }

    #[test]
    fn test_step_cap_ends_episode() {
        let params = SarsaParams {
            epsilon: 1.,
            n_episodes: 20,
            max_steps: Some(1),
            seed: Some(1),
            ..Default::default()
        };

        let solution = sarsa(&mut chain(), &params).unwrap();
        // One step from state 0 always pays -1.
        assert!(solution.episode_rewards.iter().all(|&r| r == -1.));
    }

    #[test]
    fn test_invalid_alpha() {
        let params = SarsaParams {
            alpha: 1.5,
            ..Default::default()
        };

        assert!(matches!(
            sarsa(&mut chain(), &params),
            Err(MdpError::InvalidParameter(_))
        ));
    }
}
