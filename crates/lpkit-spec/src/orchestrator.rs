//! Hands a built [`Problem`] to a [`Backend`].

use lpkit_solver::{Backend, LpSession, Problem, Solution, SolveConfig, SolveKind};
use tracing::{debug, info};

use crate::builder::ModelBuilder;
use crate::error::SpecError;
use crate::output::Output;
use crate::spec::{Options, ProblemSpec};

/// Solve once, as LP or MIP.
///
/// Non-optimal statuses are returned as data together with whatever point
/// the backend reached.
pub fn solve<B: Backend>(backend: &B, problem: &Problem, config: &SolveConfig, kind: SolveKind) -> Solution {
    debug!(?kind, presolve = config.presolve, mip_gap = config.mip_gap, "solve started");
    let solution = match kind {
        SolveKind::Lp => backend.solve_lp(problem, config),
        SolveKind::Mip => backend.solve_mip(problem, config),
    };
    info!(
        status = ?solution.status,
        objective = solution.objective_value,
        iterations = solution.iterations,
        "solve finished"
    );
    solution
}

/// Solve an LP in rounds of at most `increment` pivots.
///
/// `on_round` sees the intermediate point after every round; its first error
/// ends the solve and is returned. Otherwise stops on a terminal status, on a
/// round without progress, or when the configured iteration limit is spent.
/// Presolve is always off here. The session is dropped before returning, on
/// every path.
pub fn solve_with_iteration_budget<B, F, E>(
    backend: &B,
    problem: &Problem,
    base: &SolveConfig,
    increment: usize,
    mut on_round: F,
) -> Result<Solution, E>
where
    B: Backend,
    F: FnMut(&Solution) -> Result<(), E>,
{
    let config = base.clone().with_presolve(false);
    let increment = increment.max(1);
    let mut session = backend.start_lp(problem, &config);
    let mut done = 0;
    let mut round = 0usize;

    loop {
        let budget = match config.iteration_limit {
            Some(limit) => increment.min(limit.saturating_sub(done)),
            None => increment,
        };
        let solution = session.resume(problem, budget);
        round += 1;
        on_round(&solution)?;

        let progressed = solution.iterations > done;
        done = solution.iterations;
        let exhausted = config.iteration_limit.is_some_and(|limit| done >= limit);
        debug!(round, iterations = done, status = ?solution.status, "incremental round");

        if solution.status.is_terminal() || !progressed || exhausted {
            info!(
                rounds = round,
                status = ?solution.status,
                objective = solution.objective_value,
                "incremental solve finished"
            );
            return Ok(solution);
        }
    }
}

/// One host request: options layered over the input's own, and how to solve.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub options: Options,
    /// `None` picks MIP when any column is integer or binary
    pub kind: Option<SolveKind>,
    /// Pivots per round for incremental LP solving
    pub increment: Option<usize>,
}

impl Request {
    pub fn run<B: Backend>(&self, backend: &B, spec: &ProblemSpec) -> Result<Output, SpecError> {
        self.run_with(backend, spec, |_| Ok(()))
    }

    /// Like [`Request::run`], reporting every incremental round to `on_round`.
    /// An error from `on_round` stops the solve and is returned as is.
    pub fn run_with<B, F, E>(&self, backend: &B, spec: &ProblemSpec, mut on_round: F) -> Result<Output, E>
    where
        B: Backend,
        F: FnMut(&Output) -> Result<(), E>,
        E: From<SpecError>,
    {
        let options = spec.options.merged(&self.options);
        let config = options.solve_config();
        let rows = options.rows();

        let problem = ModelBuilder::build(spec)?;
        let kind = self.kind.unwrap_or_else(|| SolveKind::for_problem(&problem));
        let version = backend.version();

        let solution = match (kind, self.increment) {
            (SolveKind::Lp, Some(increment)) => {
                solve_with_iteration_budget(backend, &problem, &config, increment, |s| {
                    on_round(&Output::new(&problem, s, version, rows))
                })?
            }
            (SolveKind::Mip, Some(_)) => {
                debug!("increment ignored for MIP");
                solve(backend, &problem, &config, kind)
            }
            (_, None) => solve(backend, &problem, &config, kind),
        };
        Ok(Output::new(&problem, &solution, version, rows))
    }
}
