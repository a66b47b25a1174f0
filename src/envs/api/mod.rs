pub mod action;
pub mod rewards;
pub mod state;
pub mod transitions;

pub use action::{Action, ActionClass};
pub use rewards::RewardModel;
pub use state::{Availability, Capacity, Health, Speed, State};

use crate::algos::model_based::mdp::Mdp;
use crate::algos::model_free::MdpSimulator;
use crate::common::{defs::*, utils::pick_next};
use crate::config::EnvConfig;
use crate::error::{MdpError, Result};
use rand::prelude::*;
use serde_json::json;
use std::rc::Rc;
use tracing::debug;

/// The networked-service MDP. Rewards and transitions are built once in
/// [`ApiEnv::new`] and never change afterwards.
pub struct ApiEnv {
    rewards: RewardModel,
    transitions: Rc<Transitions>,
    initial: Discrete,
    terminal: Discrete,
    current: Option<Discrete>,
    rng: StdRng,
}

impl ApiEnv {
    /// `seed` fixes both the transition table and the step sampling; `None`
    /// seeds from entropy.
    pub fn new(config: &EnvConfig, seed: Option<u64>) -> Result<Self> {
        config.probabilities.validate()?;
        let rewards = RewardModel::new(config)?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let initial = config.initial_state.index();
        let terminal = config.terminal_state.index();
        let transitions =
            transitions::build_all(&mut rng, &config.probabilities, &rewards, terminal)?;

        debug!(
            states = State::COUNT,
            actions = Action::COUNT,
            entries = transitions.len(),
            "built transition table"
        );

        Ok(Self {
            rewards,
            transitions: Rc::new(transitions),
            initial,
            terminal,
            current: None,
            rng,
        })
    }

    pub fn reward_table(&self) -> &[Continous] {
        self.rewards.state_rewards()
    }

    pub fn action_penalties(&self) -> &[Continous] {
        self.rewards.action_penalties()
    }

    pub fn transition_table(&self) -> &Transitions {
        &self.transitions
    }

    pub fn initial_state(&self) -> Discrete {
        self.initial
    }

    pub fn terminal_state(&self) -> Discrete {
        self.terminal
    }

    pub fn current_state(&self) -> Option<Discrete> {
        self.current
    }
}

impl Mdp for ApiEnv {
    fn n_s(&self) -> usize {
        State::COUNT
    }

    fn n_a(&self) -> usize {
        Action::COUNT
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

impl MdpSimulator for ApiEnv {
    fn name(&self) -> String {
        "ApiEnv".to_string()
    }

    fn n_s(&self) -> usize {
        State::COUNT
    }

    fn n_a(&self) -> usize {
        Action::COUNT
    }

    fn reset(&mut self) -> Discrete {
        self.current = Some(self.initial);
        self.initial
    }

    fn step(&mut self, a: Discrete) -> Result<StepInfo> {
        let s = self.current.ok_or(MdpError::NotReset)?;
        let action = Action::from_index(a).ok_or(MdpError::ActionOutOfRange {
            action: a,
            n_a: Action::COUNT,
        })?;

        let ts = self
            .transitions
            .get(&(s, a))
            .ok_or(MdpError::MissingTransition { state: s, action: a })?;
        let next = pick_next(&mut self.rng, ts)?;
        self.current = Some(next.next_state);

        let label = |i| State::from_index(i).map(|s| s.label()).unwrap_or_default();
        Ok(StepInfo {
            next_state: next.next_state,
            reward: next.reward,
            done: next.done,
            info: json!({
                "state": label(s),
                "action": action.label(),
                "next_state": label(next.next_state),
            }),
        })
    }
}
