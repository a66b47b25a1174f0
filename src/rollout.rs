//! Running a fixed policy on a simulator and recording what happened.

use crate::algos::model_free::MdpSimulator;
use crate::common::defs::*;
use crate::error::{MdpError, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Step {
    pub state: Discrete,
    pub action: Discrete,
    pub next_state: Discrete,
    pub reward: Continous,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Rollout {
    pub histories: Vec<Vec<Step>>,
    pub total_rewards: Vec<Continous>,
    /// Whether each episode ended on a terminal state rather than the step cap.
    pub finished: Vec<bool>,
}

impl Rollout {
    pub fn mean_reward(&self) -> Continous {
        if self.total_rewards.is_empty() {
            return 0.;
        }

        self.total_rewards.iter().sum::<Continous>() / self.total_rewards.len() as Continous
    }

    pub fn completed(&self) -> usize {
        self.finished.iter().filter(|&&f| f).count()
    }
}

/// Follows `policy` for `n_episodes` episodes of at most `max_steps` steps.
pub fn run_policy(
    env: &mut dyn MdpSimulator,
    policy: &dyn Policy,
    n_episodes: usize,
    max_steps: usize,
) -> Result<Rollout> {
    let mut rollout = Rollout::default();
    for episode in 0..n_episodes {
        let mut s = env.reset();
        let mut history = vec![];
        let mut done = false;
        for _ in 0..max_steps {
            let a = policy.policy(&s).ok_or(MdpError::StateOutOfRange {
                state: s,
                n_s: env.n_s(),
            })?;
            let si = env.step(a)?;
            history.push(Step {
                state: s,
                action: a,
                next_state: si.next_state,
                reward: si.reward,
            });
            s = si.next_state;
            done = si.done;
            if done {
                break;
            }
        }

        let total = history.iter().map(|st| st.reward).sum::<Continous>();
        debug!(episode, steps = history.len(), total, "rollout episode");
        rollout.total_rewards.push(total);
        rollout.histories.push(history);
        rollout.finished.push(done);
    }

    Ok(rollout)
}
