use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::utils::argmax;

pub type Discrete = usize;
pub type Continous = f64;

/// One outcome of taking an action in a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub next_state: Discrete,
    pub probability: Continous,
    pub reward: Continous,
    pub done: bool,
}

/// Outcome lists keyed by `(state, action)`.
pub type Transitions = HashMap<(Discrete, Discrete), Vec<Transition>>;

#[derive(Debug, Clone)]
pub struct StepInfo {
    pub next_state: Discrete,
    pub reward: Continous,
    pub done: bool,
    pub info: Value,
}

pub trait Policy {
    /// Action to take in `s`, or `None` if `s` is outside the policy's domain.
    fn policy(&self, s: &Discrete) -> Option<Discrete>;
}

/// Dense stochastic policy: row `s` holds the action probabilities for state `s`.
/// Acting follows the most probable action.
impl Policy for Array2<Continous> {
    fn policy(&self, s: &Discrete) -> Option<Discrete> {
        if *s >= self.nrows() {
            return None;
        }

        Some(argmax(self.row(*s).iter().copied()))
    }
}
