use crate::algos::model_based::mdp::{common::check_transitions, Mdp};
use crate::algos::model_free::MdpSimulator;
use crate::common::{defs::*, utils::pick_next};
use crate::error::{MdpError, Result};
use rand::prelude::*;
use serde_json::Value;
use std::rc::Rc;

/// A finite MDP given directly by its transition table. Rewards and episode
/// ends are carried on the transitions themselves.
pub struct TabularMdp {
    name: String,
    n_s: usize,
    n_a: usize,
    transitions: Rc<Transitions>,
    initial: Discrete,
    current: Option<Discrete>,
    rng: StdRng,
}

impl TabularMdp {
    /// Every (state, action) pair must have a valid outcome list.
    pub fn new(
        name: &str,
        n_s: usize,
        n_a: usize,
        transitions: Transitions,
        initial: Discrete,
        seed: u64,
    ) -> Result<Self> {
        check_transitions(n_s, n_a, &transitions)?;
        if initial >= n_s {
            return Err(MdpError::StateOutOfRange {
                state: initial,
                n_s,
            });
        }

        Ok(Self {
            name: name.to_string(),
            n_s,
            n_a,
            transitions: Rc::new(transitions),
            initial,
            current: None,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl Mdp for TabularMdp {
    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

impl MdpSimulator for TabularMdp {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn reset(&mut self) -> Discrete {
        self.current = Some(self.initial);
        self.initial
    }

    fn step(&mut self, a: Discrete) -> Result<StepInfo> {
        let s = self.current.ok_or(MdpError::NotReset)?;
        let ts = self
            .transitions
            .get(&(s, a))
            .ok_or(MdpError::ActionOutOfRange { action: a, n_a: self.n_a })?;

        let next = pick_next(&mut self.rng, ts)?;
        self.current = Some(next.next_state);

        Ok(StepInfo {
            next_state: next.next_state,
            reward: next.reward,
            done: next.done,
            info: Value::Null,
        })
    }
}
