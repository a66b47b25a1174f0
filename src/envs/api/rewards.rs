use super::{Action, Availability, Capacity, Health, Speed, State};
use crate::common::defs::{Continous, Discrete};
use crate::config::{EnvConfig, RewardWeights};
use crate::error::{MdpError, Result};
use std::collections::BTreeMap;

/// Static reward lookup: one entry per state and one penalty per action.
#[derive(Debug, Clone)]
pub struct RewardModel {
    state_rewards: Vec<Continous>,
    action_penalties: Vec<Continous>,
}

/// Resolves every level of a factor in `weights`, rejecting gaps and unknown labels.
fn resolve<T, F>(
    factor: &'static str,
    levels: &[T],
    label: F,
    weights: &BTreeMap<String, f64>,
) -> Result<Vec<Continous>>
where
    F: Fn(&T) -> &'static str,
{
    if let Some(unknown) = weights
        .keys()
        .find(|k| !levels.iter().any(|l| label(l) == k.as_str()))
    {
        return Err(MdpError::UnknownState(unknown.clone()));
    }

    levels
        .iter()
        .map(|l| {
            weights
                .get(label(l))
                .copied()
                .ok_or_else(|| MdpError::MissingReward {
                    factor,
                    label: label(l).to_string(),
                })
        })
        .collect()
}

impl RewardModel {
    pub fn new(config: &EnvConfig) -> Result<Self> {
        let RewardWeights {
            availability,
            speed,
            health,
            capacity,
        } = &config.rewards;

        let avail = resolve(
            Availability::FACTOR,
            Availability::ALL,
            Availability::label,
            availability,
        )?;
        let speed = resolve(Speed::FACTOR, Speed::ALL, Speed::label, speed)?;
        let health = resolve(Health::FACTOR, Health::ALL, Health::label, health)?;
        let capacity = resolve(Capacity::FACTOR, Capacity::ALL, Capacity::label, capacity)?;

        let state_rewards = State::all()
            .iter()
            .map(|s| {
                avail[s.availability.index()]
                    + speed[s.speed.index()]
                    + health[s.health.index()]
                    + capacity[s.capacity.index()]
            })
            .collect();

        if let Some(unknown) = config
            .action_penalties
            .keys()
            .find(|k| k.parse::<Action>().is_err())
        {
            return Err(MdpError::UnknownAction(unknown.clone()));
        }

        let action_penalties = Action::ALL
            .iter()
            .map(|a| {
                config
                    .action_penalties
                    .get(a.label())
                    .copied()
                    .ok_or_else(|| MdpError::MissingPenalty(a.label().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            state_rewards,
            action_penalties,
        })
    }

    pub fn state_reward(&self, s: Discrete) -> Continous {
        self.state_rewards[s]
    }

    pub fn action_penalty(&self, a: Discrete) -> Continous {
        self.action_penalties[a]
    }

    /// Reward for landing in `next` after taking `a`.
    pub fn reward(&self, next: Discrete, a: Discrete) -> Continous {
        self.state_rewards[next] + self.action_penalties[a]
    }

    pub fn state_rewards(&self) -> &[Continous] {
        &self.state_rewards
    }

    pub fn action_penalties(&self) -> &[Continous] {
        &self.action_penalties
    }
}
