use super::super::{generate_episode, log_progress, EpisodeEvent};
use crate::algos::model_free::{check_sampling, make_rng, MdpSimulator, QTable, SampledSolution};
use crate::common::defs::*;
use crate::error::Result;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct McControlParams {
    pub gamma: Continous,
    /// Fixed for the whole run.
    pub epsilon: Continous,
    pub n_episodes: usize,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for McControlParams {
    fn default() -> Self {
        Self {
            gamma: 1.,
            epsilon: 0.1,
            n_episodes: 1000,
            max_steps: None,
            seed: None,
        }
    }
}

/// On-policy first-visit Monte Carlo control with an ε-greedy policy.
///
/// Ref: https://youtu.be/P0ZvxeQqv0A?si=RLKdOUTNEfKXE63C
pub fn mc_control_epsilon_greedy(
    env: &mut dyn MdpSimulator,
    params: &McControlParams,
) -> Result<SampledSolution> {
    check_sampling(params.gamma, params.epsilon, params.n_episodes)?;

    let mut rng = make_rng(params.seed);
    let mut q = QTable::new(env.n_a());
    let mut returns: HashMap<(Discrete, Discrete), (Continous, usize)> = HashMap::new();
    let mut episode_rewards = Vec::with_capacity(params.n_episodes);

    for i in 1..=params.n_episodes {
        let episode = generate_episode(env, params.max_steps, |s| {
            q.explore(&mut rng, s, params.epsilon)
        })?;
        let total = episode.iter().map(|e| e.r).sum::<Continous>();
        episode_rewards.push(total);

        let mut g = 0.;
        for t in (0..episode.len()).rev() {
            let EpisodeEvent { s, a, r } = episode[t];
            g = params.gamma * g + r;
            if is_first_visit(&episode, t) {
                let (sum, count) = returns.entry((s, a)).or_insert((0., 0));
                *sum += g;
                *count += 1;
                q.row_mut(s)[a] = *sum / *count as Continous;
            }
        }

        log_progress("monte carlo", i, params.n_episodes, total);
    }

    info!(env = %env.name(), states = q.len(), "monte carlo control done");
    Ok(SampledSolution {
        policy: q.greedy_policy(),
        q,
        episode_rewards,
    })
}

fn is_first_visit(ep: &[EpisodeEvent], t: usize) -> bool {
    !ep[..t].iter().any(|x| (x.s, x.a) == (ep[t].s, ep[t].a))
}
