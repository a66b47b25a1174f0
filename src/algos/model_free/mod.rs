pub mod gradient_free;

use crate::common::{defs::*, utils::*};
use crate::error::{check_gamma, check_unit, MdpError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// The model-free view of an environment: only reset and step.
pub trait MdpSimulator {
    fn name(&self) -> String;

    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn reset(&mut self) -> Discrete;

    fn step(&mut self, a: Discrete) -> Result<StepInfo>;
}

/// Action values keyed by state. A state never written reads as all zeros.
#[derive(Debug, Clone)]
pub struct QTable {
    n_a: usize,
    values: HashMap<Discrete, Array1<Continous>>,
}

impl QTable {
    pub fn new(n_a: usize) -> Self {
        Self {
            n_a,
            values: HashMap::new(),
        }
    }

    pub fn n_a(&self) -> usize {
        self.n_a
    }

    /// Number of states with an entry.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, s: Discrete) -> Array1<Continous> {
        self.values
            .get(&s)
            .cloned()
            .unwrap_or_else(|| Array1::zeros(self.n_a))
    }

    /// Value of (s, a); zero for anything never updated, including an action
    /// index outside the table.
    pub fn value(&self, s: Discrete, a: Discrete) -> Continous {
        self.values
            .get(&s)
            .and_then(|q| q.get(a).copied())
            .unwrap_or(0.)
    }

    pub fn max_value(&self, s: Discrete) -> Continous {
        self.values
            .get(&s)
            .map_or(0., |q| q.fold(Continous::NEG_INFINITY, |m, &x| m.max(x)))
    }

    pub fn row_mut(&mut self, s: Discrete) -> &mut Array1<Continous> {
        let n_a = self.n_a;
        self.values.entry(s).or_insert_with(|| Array1::zeros(n_a))
    }

    pub fn greedy(&self, s: Discrete) -> Discrete {
        self.values
            .get(&s)
            .map_or(0, |q| argmax(q.iter().copied()))
    }

    /// ε-greedy choice on the current row of `s`.
    pub fn explore(&self, rng: &mut StdRng, s: Discrete, epsilon: Continous) -> Discrete {
        match self.values.get(&s) {
            Some(q) => epsilon_greedy(rng, q.view(), epsilon),
            None => epsilon_greedy(rng, Array1::<Continous>::zeros(self.n_a).view(), epsilon),
        }
    }

    /// One-hot greedy rows for every visited state.
    pub fn greedy_policy(&self) -> StatePolicy {
        self.values
            .iter()
            .map(|(&s, q)| (s, one_hot(self.n_a, argmax(q.iter().copied()))))
            .collect()
    }

    /// Dense `n_s × n_a` view; unvisited rows hold the zero default.
    pub fn to_dense(&self, n_s: usize) -> Array2<Continous> {
        let mut q = Array2::zeros((n_s, self.n_a));
        for (&s, row) in self.values.iter().filter(|(s, _)| **s < n_s) {
            q.row_mut(s).assign(row);
        }

        q
    }
}

/// Action probabilities for the states a sampling solver has seen.
pub type StatePolicy = BTreeMap<Discrete, Array1<Continous>>;

/// States without a row act as if their action values were all zero.
impl Policy for StatePolicy {
    fn policy(&self, s: &Discrete) -> Option<Discrete> {
        Some(self.get(s).map_or(0, |p| argmax(p.iter().copied())))
    }
}

/// Expands a sparse policy into a dense one-hot matrix.
pub fn dense_policy(policy: &StatePolicy, n_s: usize, n_a: usize) -> Array2<Continous> {
    let mut pi = Array2::zeros((n_s, n_a));
    for s in 0..n_s {
        if let Some(a) = policy.policy(&s).filter(|&a| a < n_a) {
            pi[[s, a]] = 1.;
        }
    }

    pi
}

/// Output of the sampling solvers.
#[derive(Debug, Clone)]
pub struct SampledSolution {
    pub q: QTable,
    pub policy: StatePolicy,
    /// Undiscounted reward collected in each episode.
    pub episode_rewards: Vec<Continous>,
}

/// Hyperparameters shared by the sampling solvers.
pub(crate) fn check_sampling(
    gamma: Continous,
    epsilon: Continous,
    n_episodes: usize,
) -> Result<()> {
    check_gamma(gamma)?;
    check_unit("epsilon", epsilon)?;
    if n_episodes == 0 {
        return Err(MdpError::InvalidParameter(
            "episode count must be positive".to_string(),
        ));
    }

    Ok(())
}

pub(crate) fn check_alpha(alpha: Continous) -> Result<()> {
    if alpha > 0. && alpha <= 1. {
        Ok(())
    } else {
        Err(MdpError::InvalidParameter(format!(
            "learning rate {alpha} not in (0, 1]"
        )))
    }
}

pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
