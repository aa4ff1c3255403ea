use crate::branch::BranchAndBound;
use crate::config::{Deadline, SolveConfig};
use crate::problem::Problem;
use crate::simplex::Simplex;
use crate::solution::Solution;

/// Version string reported alongside every result.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The solve capability a model is handed to.
pub trait Backend {
    type Session: LpSession;

    fn version(&self) -> &str;

    fn solve_lp(&self, problem: &Problem, config: &SolveConfig) -> Solution;

    fn solve_mip(&self, problem: &Problem, config: &SolveConfig) -> Solution;

    /// Begin an LP solve that is advanced by [`LpSession::resume`].
    fn start_lp(&self, problem: &Problem, config: &SolveConfig) -> Self::Session;
}

/// An LP solve in progress. Dropping it releases its working storage.
pub trait LpSession {
    /// Perform up to `iterations` more pivots and report the current point.
    fn resume(&mut self, problem: &Problem, iterations: usize) -> Solution;
}

/// Built-in backend: tableau simplex for LP, branch-and-bound for MIP.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    integer_tolerance: Option<f64>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_integer_tolerance(mut self, tol: f64) -> Self {
        self.integer_tolerance = Some(tol);
        self
    }
}

impl Backend for Solver {
    type Session = SimplexSession;

    fn version(&self) -> &str {
        VERSION
    }

    fn solve_lp(&self, problem: &Problem, config: &SolveConfig) -> Solution {
        let mut simplex = Simplex::new(problem, config);
        simplex.run(config.iteration_limit, Deadline::after(config.time_limit));
        simplex.solution(problem)
    }

    fn solve_mip(&self, problem: &Problem, config: &SolveConfig) -> Solution {
        let mut bnb = BranchAndBound::new();
        if let Some(tol) = self.integer_tolerance {
            bnb = bnb.with_integer_tolerance(tol);
        }
        bnb.solve(problem, config)
    }

    fn start_lp(&self, problem: &Problem, config: &SolveConfig) -> SimplexSession {
        SimplexSession {
            simplex: Simplex::new(problem, config),
            deadline: Deadline::after(config.time_limit),
        }
    }
}

pub struct SimplexSession {
    simplex: Simplex,
    deadline: Deadline,
}

impl SimplexSession {
    pub fn iterations(&self) -> usize {
        self.simplex.iterations()
    }

    pub fn is_finished(&self) -> bool {
        self.simplex.is_finished()
    }
}

impl LpSession for SimplexSession {
    fn resume(&mut self, problem: &Problem, iterations: usize) -> Solution {
        self.simplex.run(Some(iterations), self.deadline);
        self.simplex.solution(problem)
    }
}
