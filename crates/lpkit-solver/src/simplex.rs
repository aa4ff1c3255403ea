use tracing::{debug, info};

use crate::config::{Deadline, MessageLevel, SolveConfig};
use crate::problem::Problem;
use crate::solution::{Solution, Status};
use crate::standard::{ConstraintOp, Origin, StandardForm};

/// Degenerate pivots in a row before switching to Bland's rule.
const DEGENERATE_STREAK_LIMIT: usize = 50;

/// Two-phase tableau simplex that can be stopped and resumed.
///
/// Each call to [`Simplex::run`] performs at most a budget of pivots and
/// keeps the tableau, so a later call continues from the same basis.
pub(crate) struct Simplex {
    form: StandardForm,
    tableau: Tableau,
    phase: Phase,
    iterations: usize,
    degenerate_streak: usize,
    tolerance: f64,
    feasibility_tolerance: f64,
    msg_level: MessageLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    One,
    Two,
    Done(Terminal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    Optimal,
    Unbounded,
    Infeasible,
}

enum Step {
    Pivoted,
    Optimal,
    Unbounded,
}

impl Simplex {
    pub fn new(problem: &Problem, config: &SolveConfig) -> Self {
        let tolerance = 1e-9;
        let form = StandardForm::from_problem(problem, config.presolve, tolerance);
        let tableau = Tableau::build(&form);

        let phase = if let Some(row) = form.presolve_infeasible {
            if config.msg_level.shows(MessageLevel::On) {
                info!(row = row + 1, "presolve: row has no feasible activity");
            }
            Phase::Done(Terminal::Infeasible)
        } else if tableau.n_artificial > 0 {
            Phase::One
        } else {
            Phase::Two
        };

        let mut simplex = Self {
            form,
            tableau,
            phase,
            iterations: 0,
            degenerate_streak: 0,
            tolerance,
            feasibility_tolerance: 1e-7,
            msg_level: config.msg_level,
        };
        if simplex.phase == Phase::One {
            simplex.start_phase_one();
        }
        if simplex.msg_level.shows(MessageLevel::On) {
            info!(
                constraints = simplex.form.num_constraints(),
                variables = simplex.form.num_vars,
                "simplex: tableau ready"
            );
        }
        simplex
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Done(_))
    }

    /// Pivot until a terminal state, `budget` pivots, or the deadline.
    pub(crate) fn run(&mut self, budget: Option<usize>, deadline: Deadline) -> usize {
        let start = self.iterations;
        loop {
            let exclude_from = match self.phase {
                Phase::Done(_) => break,
                Phase::One => None,
                Phase::Two => Some(self.tableau.artificial_start()),
            };
            if budget.is_some_and(|b| self.iterations - start >= b) || deadline.expired() {
                break;
            }
            match self.step(exclude_from) {
                Step::Pivoted => {
                    self.iterations += 1;
                    if self.iterations % 100 == 0 && self.msg_level.shows(MessageLevel::On) {
                        info!(
                            iteration = self.iterations,
                            objective = self.tableau.objective_value(),
                            "simplex: progress"
                        );
                    }
                }
                Step::Optimal if self.phase == Phase::One => self.finish_phase_one(),
                Step::Optimal => self.phase = Phase::Done(Terminal::Optimal),
                // unbounded phase 1 means the original is infeasible
                Step::Unbounded if self.phase == Phase::One => {
                    self.phase = Phase::Done(Terminal::Infeasible)
                }
                Step::Unbounded => self.phase = Phase::Done(Terminal::Unbounded),
            }
        }

        if let Phase::Done(terminal) = self.phase {
            if self.msg_level.shows(MessageLevel::On) {
                info!(?terminal, iterations = self.iterations, "simplex: finished");
            }
        }
        self.iterations - start
    }

    pub fn status(&self) -> Status {
        match self.phase {
            Phase::Done(Terminal::Optimal) => Status::Optimal,
            Phase::Done(Terminal::Unbounded) => Status::Unbounded,
            Phase::Done(Terminal::Infeasible) => Status::NoFeasible,
            Phase::One => Status::Infeasible,
            Phase::Two => Status::Feasible,
        }
    }

    /// Snapshot of the current basic solution, mapped back onto `problem`.
    pub fn solution(&self, problem: &Problem) -> Solution {
        let n_constraints = self.tableau.basic_vars.len();
        let rhs_col = self.tableau.rhs_col();

        let mut v = vec![0.0; self.form.num_vars];
        for i in 0..n_constraints {
            let basic = self.tableau.basic_vars[i];
            if basic < self.form.num_vars {
                v[basic] = self.tableau.data[i][rhs_col];
            }
        }
        let values = self.form.recover(&v);
        let objective_value = problem.objective_value(&values);

        Solution {
            status: self.status(),
            objective_value,
            values,
            duals: Some(self.duals(problem.num_rows())),
            iterations: self.iterations,
        }
    }

    fn duals(&self, num_rows: usize) -> Vec<f64> {
        let mut duals = vec![0.0; num_rows];
        let priced = matches!(
            self.phase,
            Phase::Two | Phase::Done(Terminal::Optimal) | Phase::Done(Terminal::Unbounded)
        );
        if !priced {
            return duals;
        }
        let obj_row = self.tableau.obj_row();
        for (k, constraint) in self.form.constraints.iter().enumerate() {
            let Origin::Row(i) = constraint.origin else {
                continue;
            };
            let (col, flip) = self.tableau.dual_cols[k];
            let y = -self.tableau.data[obj_row][col] * flip;
            duals[i] += self.form.sense * y;
        }
        for d in &mut duals {
            if d.abs() < self.tolerance {
                *d = 0.0;
            }
        }
        duals
    }

    fn start_phase_one(&mut self) {
        // Auxiliary objective: maximize -sum(artificials)
        let tableau = &mut self.tableau;
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.artificial_start();

        tableau.saved_objective = Some(tableau.data[obj_row].clone());

        for j in 0..n_cols {
            tableau.data[obj_row][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Price out the basic artificials
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }
        if self.msg_level.shows(MessageLevel::All) {
            debug!(artificials = tableau.n_artificial, "simplex: phase 1");
        }
    }

    fn finish_phase_one(&mut self) {
        let obj_row = self.tableau.obj_row();
        let rhs_col = self.tableau.rhs_col();
        let art_start = self.tableau.artificial_start();

        for i in 0..obj_row {
            if self.tableau.basic_vars[i] >= art_start
                && self.tableau.data[i][rhs_col].abs() > self.feasibility_tolerance
            {
                if self.msg_level.shows(MessageLevel::On) {
                    info!("simplex: problem has no primal feasible solution");
                }
                self.phase = Phase::Done(Terminal::Infeasible);
                return;
            }
        }

        // Drive zero-level artificials out of the basis where possible
        for i in 0..obj_row {
            if self.tableau.basic_vars[i] >= art_start {
                let entering = (0..art_start)
                    .find(|&j| self.tableau.data[i][j].abs() > self.feasibility_tolerance);
                if let Some(j) = entering {
                    self.tableau.pivot(i, j);
                }
            }
        }

        // Restore the original objective and price out the basis
        let n_cols = self.tableau.n_cols();
        if let Some(saved) = self.tableau.saved_objective.take() {
            self.tableau.data[obj_row] = saved;
        }
        for i in 0..obj_row {
            let basic = self.tableau.basic_vars[i];
            let ratio = self.tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    self.tableau.data[obj_row][j] -= ratio * self.tableau.data[i][j];
                }
            }
        }

        if self.msg_level.shows(MessageLevel::All) {
            debug!(iterations = self.iterations, "simplex: phase 2");
        }
        self.phase = Phase::Two;
    }

    fn step(&mut self, exclude_from: Option<usize>) -> Step {
        let bland = self.degenerate_streak >= DEGENERATE_STREAK_LIMIT;
        let Some(pivot_col) = self.find_pivot_column(exclude_from, bland) else {
            return Step::Optimal;
        };
        let Some((pivot_row, ratio)) = self.find_pivot_row(pivot_col) else {
            return Step::Unbounded;
        };
        if ratio <= self.tolerance {
            self.degenerate_streak += 1;
        } else {
            self.degenerate_streak = 0;
        }
        self.tableau.pivot(pivot_row, pivot_col);
        Step::Pivoted
    }

    fn find_pivot_column(&self, exclude_from: Option<usize>, bland: bool) -> Option<usize> {
        let obj_row = self.tableau.obj_row();
        let n_cols = exclude_from.unwrap_or(self.tableau.rhs_col());
        let reduced = &self.tableau.data[obj_row][..n_cols];

        if bland {
            return reduced.iter().position(|&d| d > self.tolerance);
        }

        // Most positive reduced cost
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &d) in reduced.iter().enumerate() {
            if d > max_val {
                max_val = d;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, col: usize) -> Option<(usize, f64)> {
        let rhs_col = self.tableau.rhs_col();

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..self.tableau.obj_row() {
            let val = self.tableau.data[i][col];
            if val > self.tolerance {
                let ratio = self.tableau.data[i][rhs_col].max(0.0) / val;
                let better = ratio < min_ratio - self.tolerance
                    || (ratio <= min_ratio + self.tolerance
                        && min_row.is_some_and(|r| {
                            self.tableau.basic_vars[i] < self.tableau.basic_vars[r]
                        }));
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row.map(|r| (r, min_ratio))
    }
}

/// Dense tableau: one row per standard-form constraint plus the objective
/// row, columns for structural, slack/surplus and artificial variables plus
/// the right-hand side.
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    /// Column carrying each constraint's dual, and the sign applied to it
    dual_cols: Vec<(usize, f64)>,
    saved_objective: Option<Vec<f64>>,
}

impl Tableau {
    fn build(form: &StandardForm) -> Self {
        let n_vars = form.num_vars;
        let n_constraints = form.num_constraints();

        // Normalize to non-negative right-hand sides first
        let normalized: Vec<(ConstraintOp, f64, f64)> = form
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (op, -c.rhs, -1.0)
                } else {
                    (c.op, c.rhs, 1.0)
                }
            })
            .collect();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (op, _, _) in &normalized {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
            dual_cols: Vec::with_capacity(n_constraints),
            saved_objective: None,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, &(op, rhs, flip))) in form.constraints.iter().zip(&normalized).enumerate() {
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = flip * coef;
            }
            tableau.data[i][total_cols - 1] = rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    tableau.dual_cols.push((slack_idx, flip));
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.dual_cols.push((artificial_idx, flip));
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.dual_cols.push((artificial_idx, flip));
                    artificial_idx += 1;
                }
            }
        }

        // Objective row holds reduced costs of the maximization form
        tableau.data[n_constraints][..n_vars].copy_from_slice(&form.objective);

        tableau
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn rhs_col(&self) -> usize {
        self.n_cols() - 1
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    /// Current value of the maximization objective
    fn objective_value(&self) -> f64 {
        -self.data[self.obj_row()][self.rhs_col()]
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_rows = self.data.len();
        let n_cols = self.n_cols();

        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for i in 0..n_rows {
            if i != row {
                let factor = self.data[i][col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        self.data[i][j] -= factor * pivot_row[j];
                    }
                }
            }
        }
    }
}
