//! Per-factor transition rules and the one-off randomised construction of the
//! transition table.
//!
//! Every (state, action) gets three outcomes, in order: the primary (intended)
//! next state, the secondary (contrary) next state and a self-loop carrying
//! whatever probability is left.

use super::rewards::RewardModel;
use super::{Action, Availability, Capacity, Health, Speed, State};
use crate::common::defs::{Continous, Discrete, Transition, Transitions};
use crate::common::utils::check_distribution;
use crate::config::{ProbRange, ProbabilityRanges};
use crate::error::Result;
use rand::prelude::*;

/// Which of the two modelled effects of an action a rule describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The most likely, intended effect.
    Primary,
    /// The second most likely effect, usually the opposite of the intended one.
    Secondary,
}

use Outcome::*;

pub fn availability(
    action: Action,
    outcome: Outcome,
    avail: Availability,
    health: Health,
) -> Availability {
    use Availability::*;

    match (action, outcome) {
        (Action::DecreaseCpu | Action::DecreaseCpuSlightly, _) => {
            if health == Health::Error || health == Health::Overloaded {
                Offline
            } else {
                Available
            }
        }
        (a, Primary) if a.is_maintenance() => Available,
        (a, Secondary) if a.is_maintenance() => Offline,
        (Action::UpdateVersion, _) => {
            if health == Health::Error {
                Offline
            } else {
                Available
            }
        }
        (Action::RollbackVersion, Primary) => Available,
        (Action::RollbackVersion, Secondary) => Offline,
        (Action::AddMemory, _) => Available,
        (Action::RemoveMemory, _) => {
            if health == Health::Error {
                Offline
            } else {
                Available
            }
        }
        _ => avail,
    }
}

pub fn speed(action: Action, outcome: Outcome, speed: Speed) -> Speed {
    use Speed::*;

    match (action, outcome) {
        (Action::IncreaseCpu, Primary) => Fast,
        (Action::IncreaseCpu, Secondary) => {
            if speed == Fast {
                Medium
            } else {
                Slow
            }
        }
        (Action::IncreaseCpuSlightly, Primary) if speed == Slow => Medium,
        (Action::IncreaseCpuSlightly, Secondary) if speed == Medium => Slow,
        (Action::DecreaseCpu, Primary) => {
            if speed == Fast {
                Medium
            } else {
                Slow
            }
        }
        (Action::DecreaseCpu, Secondary) => {
            if speed == Slow {
                Fast
            } else {
                Medium
            }
        }
        (Action::DecreaseCpuSlightly, Primary) if speed == Fast => Medium,
        (Action::DecreaseCpuSlightly, Secondary) if speed == Slow => Fast,
        (Action::UpdateVersion, Primary) => Medium,
        (Action::UpdateVersion, Secondary) => Fast,
        (Action::RollbackVersion, Primary) => Slow,
        (Action::RollbackVersion, Secondary) => Medium,
        (Action::AddMemory, Secondary) => Slow,
        (Action::RemoveMemory, Primary) => Slow,
        (Action::RemoveMemory, Secondary) => Fast,
        _ => speed,
    }
}

/// `coin` resolves the version update's uncertain outcome: `true` means it breaks.
pub fn health(action: Action, outcome: Outcome, health: Health, coin: bool) -> Health {
    use Health::*;

    match (action, outcome) {
        (Action::CorrectiveMaintenance, Primary) => Healthy,
        (Action::CorrectiveMaintenance, Secondary) => {
            if health == Healthy {
                Error
            } else {
                Overloaded
            }
        }
        (Action::PreventiveMaintenance, Primary) if health == Overloaded => Healthy,
        (Action::PreventiveMaintenance, Secondary) if health == Healthy => Overloaded,
        (Action::RestartComponents, Primary) => Healthy,
        (Action::RestartComponents, Secondary) => Error,
        (Action::UpdateVersion, Primary) => {
            if coin {
                Error
            } else {
                Healthy
            }
        }
        (Action::UpdateVersion, Secondary) => {
            if coin {
                Error
            } else {
                Overloaded
            }
        }
        (Action::RollbackVersion, Primary) => Healthy,
        (Action::RollbackVersion, Secondary) => Error,
        (Action::AddMemory, Primary) => {
            if health == Error {
                Overloaded
            } else {
                Healthy
            }
        }
        (Action::AddMemory, Secondary) => Healthy,
        (Action::RemoveMemory, Primary) => Overloaded,
        (Action::RemoveMemory, Secondary) => Error,
        _ => health,
    }
}

pub fn capacity(action: Action, outcome: Outcome, capacity: Capacity) -> Capacity {
    use Capacity::*;

    match (action, outcome) {
        (Action::DecreaseCpu | Action::DecreaseCpuSlightly, Primary) => {
            if capacity == High {
                Medium
            } else {
                Low
            }
        }
        (Action::DecreaseCpu | Action::DecreaseCpuSlightly, Secondary) => {
            if capacity == Low {
                High
            } else {
                Medium
            }
        }
        (Action::AddMemory, Primary) => {
            if capacity == Medium {
                High
            } else {
                Medium
            }
        }
        (Action::AddMemory, Secondary) => {
            if capacity == High {
                Low
            } else {
                Medium
            }
        }
        (Action::RemoveMemory, Primary) => {
            if capacity == High {
                Low
            } else {
                Medium
            }
        }
        (Action::RemoveMemory, Secondary) => {
            if capacity == Low {
                High
            } else {
                Medium
            }
        }
        (a, Primary) if a.is_maintenance() => Medium,
        (a, Secondary) if a.is_maintenance() => Low,
        (Action::UpdateVersion, Primary) => High,
        (Action::UpdateVersion, Secondary) => Low,
        (Action::RollbackVersion, Primary) => Low,
        (Action::RollbackVersion, Secondary) => Medium,
        _ => capacity,
    }
}

fn replace<T: PartialEq>(from: T, to: T, x: T) -> T {
    if x == from {
        to
    } else {
        x
    }
}

/// Joint speed, capacity and health rule of the maintenance actions. `None` for
/// every other action.
pub fn maintenance(
    action: Action,
    outcome: Outcome,
    speed: Speed,
    capacity: Capacity,
    health: Health,
) -> Option<(Speed, Capacity, Health)> {
    let joint = match (action, outcome) {
        (Action::CorrectiveMaintenance, Primary) => (
            replace(Speed::Slow, Speed::Medium, speed),
            replace(Capacity::Low, Capacity::Medium, capacity),
            Health::Healthy,
        ),
        (Action::CorrectiveMaintenance, Secondary) => (
            replace(Speed::Medium, Speed::Slow, speed),
            replace(Capacity::Medium, Capacity::Low, capacity),
            Health::Error,
        ),
        (Action::PreventiveMaintenance, Primary) => (
            replace(Speed::Fast, Speed::Medium, speed),
            replace(Capacity::High, Capacity::Medium, capacity),
            health,
        ),
        (Action::PreventiveMaintenance, Secondary) => (
            replace(Speed::Fast, Speed::Slow, speed),
            replace(Capacity::High, Capacity::Low, capacity),
            Health::Error,
        ),
        (Action::RestartComponents, Primary) => (Speed::Slow, Capacity::Low, Health::Healthy),
        (Action::RestartComponents, Secondary) => (Speed::Slow, Capacity::Low, Health::Error),
        _ => return None,
    };

    Some(joint)
}

/// Applies the per-factor rules to `s`; maintenance actions override speed,
/// capacity and health jointly.
pub fn next_state(s: State, action: Action, outcome: Outcome, coin: bool) -> State {
    let availability = availability(action, outcome, s.availability, s.health);

    match maintenance(action, outcome, s.speed, s.capacity, s.health) {
        Some((speed, capacity, health)) => State::new(availability, speed, health, capacity),
        None => State::new(
            availability,
            speed(action, outcome, s.speed),
            health(action, outcome, s.health, coin),
            capacity(action, outcome, s.capacity),
        ),
    }
}

fn sample(rng: &mut StdRng, range: ProbRange) -> Continous {
    rng.gen_range(range.low..=range.high)
}

/// Outcome probabilities `(primary, secondary, remainder)`, clipped onto the simplex.
pub fn outcome_probabilities(
    rng: &mut StdRng,
    ranges: &ProbabilityRanges,
    action: Action,
) -> (Continous, Continous, Continous) {
    let primary = sample(rng, ranges.primary(action));
    let mut secondary = sample(rng, ranges.secondary);
    if primary + secondary > 1. {
        secondary = 1. - primary;
    }
    let remainder = (1. - primary - secondary).max(0.);

    (primary, secondary, remainder)
}

/// Builds the outcome list of one (state, action) pair.
pub fn build(
    rng: &mut StdRng,
    ranges: &ProbabilityRanges,
    rewards: &RewardModel,
    terminal: Discrete,
    s: State,
    action: Action,
) -> Vec<Transition> {
    let primary = next_state(s, action, Primary, rng.gen_bool(0.5));
    let secondary = next_state(s, action, Secondary, rng.gen_bool(0.5));
    let (p_primary, p_secondary, p_remainder) = outcome_probabilities(rng, ranges, action);

    [(primary, p_primary), (secondary, p_secondary), (s, p_remainder)]
        .into_iter()
        .map(|(next, probability)| Transition {
            next_state: next.index(),
            probability,
            reward: rewards.reward(next.index(), action.index()),
            done: next.index() == terminal,
        })
        .collect()
}

/// Builds the full table once. The draws depend only on `rng`, so a seeded
/// generator reproduces the same table.
pub fn build_all(
    rng: &mut StdRng,
    ranges: &ProbabilityRanges,
    rewards: &RewardModel,
    terminal: Discrete,
) -> Result<Transitions> {
    let mut transitions = Transitions::with_capacity(State::COUNT * Action::COUNT);
    for s in State::all() {
        for &a in Action::ALL {
            let ts = build(rng, ranges, rewards, terminal, s, a);
            check_distribution(s.index(), a.index(), &ts)?;
            transitions.insert((s.index(), a.index()), ts);
        }
    }

    Ok(transitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use float_eq::*;
    use rstest::rstest;

    fn st(label: &str) -> State {
        label.parse().unwrap()
    }

    #[rstest]
    #[case("Offline_Slow_Error_Medium", Action::RestartComponents, Primary, "Available_Slow_Healthy_Low")]
    #[case("Offline_Slow_Error_Medium", Action::RestartComponents, Secondary, "Offline_Slow_Error_Low")]
    #[case("Available_Slow_Healthy_Low", Action::IncreaseCpu, Primary, "Available_Fast_Healthy_Low")]
    #[case("Available_Fast_Healthy_Medium", Action::AddMemory, Primary, "Available_Fast_Healthy_High")]
    #[case("Available_Fast_Healthy_High", Action::AddMemory, Secondary, "Available_Slow_Healthy_Low")]
    #[case("Available_Medium_Overloaded_High", Action::DecreaseCpu, Primary, "Offline_Slow_Overloaded_Medium")]
    #[case("Available_Slow_Healthy_Low", Action::DecreaseCpu, Secondary, "Available_Fast_Healthy_High")]
    #[case("Offline_Slow_Overloaded_Low", Action::CorrectiveMaintenance, Primary, "Available_Medium_Healthy_Medium")]
    #[case("Available_Medium_Healthy_Medium", Action::CorrectiveMaintenance, Secondary, "Offline_Slow_Error_Low")]
    #[case("Available_Fast_Overloaded_High", Action::PreventiveMaintenance, Primary, "Available_Medium_Overloaded_Medium")]
    #[case("Available_Fast_Healthy_Medium", Action::RemoveMemory, Primary, "Available_Slow_Overloaded_Medium")]
    #[case("Available_Fast_Error_High", Action::RollbackVersion, Secondary, "Offline_Medium_Error_Medium")]
    #[case("Offline_Fast_Healthy_Low", Action::IncreaseCpuSlightly, Primary, "Offline_Fast_Healthy_Low")]
    fn test_factor_rules(
        #[case] from: &str,
        #[case] action: Action,
        #[case] outcome: Outcome,
        #[case] to: &str,
    ) {
        assert_eq!(next_state(st(from), action, outcome, false), st(to));
    }

    #[test]
    fn test_update_version_health_follows_coin() {
        let s = st("Available_Slow_Healthy_Low");
        assert_eq!(
            next_state(s, Action::UpdateVersion, Primary, true),
            st("Available_Medium_Error_High")
        );
        assert_eq!(
            next_state(s, Action::UpdateVersion, Primary, false),
            st("Available_Medium_Healthy_High")
        );
        assert_eq!(
            next_state(s, Action::UpdateVersion, Secondary, false),
            st("Available_Fast_Overloaded_Low")
        );
    }

    #[test]
    fn test_non_maintenance_actions_have_no_joint_rule() {
        for &a in Action::ALL {
            let joint = maintenance(a, Primary, Speed::Slow, Capacity::Low, Health::Error);
            assert_eq!(joint.is_some(), a.is_maintenance(), "{a}");
        }
    }

    #[test]
    fn test_probabilities_are_clipped_onto_simplex() {
        let mut ranges = ProbabilityRanges::default();
        ranges.restart = ProbRange::new(0.95, 0.95);
        ranges.secondary = ProbRange::new(0.2, 0.2);

        let rng = &mut StdRng::seed_from_u64(7);
        let (p, q, r) = outcome_probabilities(rng, &ranges, Action::RestartComponents);

        assert_float_eq!(p, 0.95, abs <= 1e-12);
        assert_float_eq!(q, 0.05, abs <= 1e-12);
        assert_float_eq!(r, 0., abs <= 1e-12);
    }

    #[test]
    fn test_every_distribution_is_valid() {
        let config = EnvConfig::default();
        let rewards = RewardModel::new(&config).unwrap();
        let rng = &mut StdRng::seed_from_u64(2718);
        let ts = build_all(rng, &config.probabilities, &rewards, 47).unwrap();

        assert_eq!(ts.len(), State::COUNT * Action::COUNT);
        for ((s, a), outcomes) in ts.iter() {
            assert_eq!(outcomes.len(), 3);
            assert_eq!(outcomes[2].next_state, *s);
            assert!(outcomes.iter().all(|t| (0. ..=1.).contains(&t.probability)));
            let sum = outcomes.iter().map(|t| t.probability).sum::<f64>();
            assert_float_eq!(sum, 1., abs <= 1e-9, "s={s}, a={a}");
        }
    }

    #[test]
    fn test_seeded_build_is_reproducible() {
        let config = EnvConfig::default();
        let rewards = RewardModel::new(&config).unwrap();
        let build = || {
            build_all(&mut StdRng::seed_from_u64(1), &config.probabilities, &rewards, 47).unwrap()
        };
        let (a, b) = (build(), build());

        assert_eq!(a, b);
    }
}
