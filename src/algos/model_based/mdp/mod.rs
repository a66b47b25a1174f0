pub mod common;
pub mod pe;
pub mod pi;
pub mod vi;

use crate::common::defs::*;
use crate::error::Result;
use common::Convergence;
use ndarray::{Array1, Array2};
use std::rc::Rc;

/// Markov Decision Process - Sutton & Barto 2018.
///
/// The model-based view of an environment: solvers read the frozen transition
/// table and never step the environment.
pub trait Mdp {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn transitions(&self) -> Rc<Transitions>;
}

pub trait MdpSolver {
    fn v_star(&self, s: Discrete) -> Option<Continous>;

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous>;

    fn pi_star(&self, s: Discrete) -> Option<Discrete>;

    /// Runs until `theta` is met or `num_iterations` rounds have been spent.
    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> Result<Convergence>;
}

pub struct MdpSolverPolicy {
    pub mdp_solver: Rc<dyn MdpSolver>,
}

impl Policy for MdpSolverPolicy {
    fn policy(&self, s: &Discrete) -> Option<Discrete> {
        self.mdp_solver.pi_star(*s)
    }
}

/// Output of the model-based solvers.
#[derive(Debug, Clone)]
pub struct DpSolution {
    /// One-hot rows: the greedy action of each state.
    pub policy: Array2<Continous>,
    pub v: Array1<Continous>,
    pub iterations: usize,
}
