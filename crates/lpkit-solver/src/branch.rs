//! Depth-first branch-and-bound over simplex relaxations.

use tracing::{debug, info};

use crate::config::{Deadline, MessageLevel, SolveConfig};
use crate::problem::{ColumnBounds, Direction, Problem};
use crate::simplex::Simplex;
use crate::solution::{Solution, Status};

/// A bound change from branching, on a 0-based column.
#[derive(Debug, Clone, Copy)]
struct BoundChange {
    column: usize,
    lower: f64,
    upper: f64,
}

#[derive(Debug, Clone)]
struct Node {
    changes: Vec<BoundChange>,
    /// Parent relaxation objective, as a minimization score
    bound: f64,
    depth: usize,
}

impl Node {
    fn bounds_of(&self, problem: &Problem, column: usize) -> (f64, f64) {
        self.changes
            .iter()
            .rev()
            .find(|c| c.column == column)
            .map(|c| (c.lower, c.upper))
            .unwrap_or_else(|| {
                let c = &problem.columns()[column];
                (c.lower(), c.upper())
            })
    }

    fn child(&self, change: BoundChange, bound: f64) -> Node {
        let mut changes = self.changes.clone();
        changes.push(change);
        Node {
            changes,
            bound,
            depth: self.depth + 1,
        }
    }
}

struct Incumbent {
    score: f64,
    values: Vec<f64>,
}

enum Stop {
    Complete,
    Limit,
    Gap,
    Unbounded(Solution),
}

pub struct BranchAndBound {
    /// Distance from an integer below which a value counts as integral
    integer_tolerance: f64,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            integer_tolerance: 1e-6,
        }
    }
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_integer_tolerance(mut self, tol: f64) -> Self {
        self.integer_tolerance = tol;
        self
    }

    pub fn solve(&self, problem: &Problem, config: &SolveConfig) -> Solution {
        let deadline = Deadline::after(config.time_limit);
        let verbose = config.msg_level.shows(MessageLevel::On);
        let sense = match problem.direction {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        };
        let integer_columns: Vec<usize> = problem
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind.is_integer())
            .map(|(j, _)| j)
            .collect();

        let mut lp_config = config.clone();
        if !config.msg_level.shows(MessageLevel::Debug) {
            lp_config.msg_level = MessageLevel::Off;
        }

        if verbose {
            info!(
                integer = integer_columns.len(),
                binary = problem.num_binary(),
                "mip: branch-and-bound started"
            );
        }

        let mut stack = vec![Node {
            changes: Vec::new(),
            bound: f64::NEG_INFINITY,
            depth: 0,
        }];
        let mut incumbent: Option<Incumbent> = None;
        let mut iterations = 0;
        let mut nodes = 0usize;

        let stop = loop {
            let Some(node) = stack.pop() else {
                break Stop::Complete;
            };
            if deadline.expired() {
                break Stop::Limit;
            }
            if let Some(inc) = &incumbent {
                if !improves(node.bound, inc.score) {
                    continue;
                }
            }
            nodes += 1;

            let mut relaxed = problem.clone();
            for change in &node.changes {
                if let Some(column) = relaxed.column_mut(change.column + 1) {
                    column.set_bounds(ColumnBounds::Explicit {
                        lower: change.lower,
                        upper: change.upper,
                    });
                }
            }

            let mut simplex = Simplex::new(&relaxed, &lp_config);
            simplex.run(config.iteration_limit, deadline);
            let lp = simplex.solution(&relaxed);
            iterations += lp.iterations;

            match lp.status {
                Status::Optimal => {}
                Status::NoFeasible => {
                    if config.msg_level.shows(MessageLevel::All) {
                        debug!(node = nodes, depth = node.depth, "mip: relaxation infeasible");
                    }
                    continue;
                }
                Status::Unbounded => break Stop::Unbounded(lp),
                _ => break Stop::Limit,
            }

            let score = sense * lp.objective_value;
            if let Some(inc) = &incumbent {
                if !improves(score, inc.score) {
                    continue;
                }
            }

            let fractional = integer_columns
                .iter()
                .map(|&j| (j, lp.values[j]))
                .filter(|(_, v)| (v - v.round()).abs() > self.integer_tolerance)
                .max_by(|a, b| {
                    let fa = (a.1 - a.1.floor() - 0.5).abs();
                    let fb = (b.1 - b.1.floor() - 0.5).abs();
                    fb.total_cmp(&fa)
                });

            match fractional {
                None => {
                    if verbose {
                        info!(
                            node = nodes,
                            objective = lp.objective_value,
                            "mip: new incumbent"
                        );
                    }
                    let mut values = lp.values;
                    for &j in &integer_columns {
                        values[j] = values[j].round();
                    }
                    incumbent = Some(Incumbent { score, values });
                }
                Some((j, value)) => {
                    if config.msg_level.shows(MessageLevel::All) {
                        debug!(node = nodes, column = j + 1, value, "mip: branching");
                    }
                    let (lower, upper) = node.bounds_of(problem, j);
                    let down = node.child(
                        BoundChange {
                            column: j,
                            lower,
                            upper: value.floor(),
                        },
                        score,
                    );
                    let up = node.child(
                        BoundChange {
                            column: j,
                            lower: value.ceil(),
                            upper,
                        },
                        score,
                    );
                    // the nearer side is explored first
                    if value - value.floor() < 0.5 {
                        stack.push(up);
                        stack.push(down);
                    } else {
                        stack.push(down);
                        stack.push(up);
                    }
                }
            }

            if let Some(inc) = &incumbent {
                if config.mip_gap > 0.0 && !stack.is_empty() {
                    let best_bound = stack
                        .iter()
                        .map(|n| n.bound)
                        .fold(f64::INFINITY, f64::min);
                    let gap = (inc.score - best_bound).abs() / (f64::EPSILON + inc.score.abs());
                    if gap <= config.mip_gap {
                        break Stop::Gap;
                    }
                }
            }
        };

        if verbose {
            info!(nodes, iterations, "mip: search finished");
        }

        let (status, values) = match (stop, incumbent) {
            (Stop::Unbounded(lp), _) => (Status::Unbounded, lp.values),
            (Stop::Complete, Some(inc)) => (Status::Optimal, inc.values),
            (Stop::Complete, None) => (Status::NoFeasible, vec![0.0; problem.num_columns()]),
            (Stop::Limit | Stop::Gap, Some(inc)) => (Status::Feasible, inc.values),
            (Stop::Limit | Stop::Gap, None) => (Status::Undefined, vec![0.0; problem.num_columns()]),
        };

        Solution {
            status,
            objective_value: problem.objective_value(&values),
            values,
            duals: None,
            iterations,
        }
    }
}

/// Whether a minimization score can still beat the incumbent.
fn improves(score: f64, incumbent: f64) -> bool {
    score < incumbent - 1e-9 * (1.0 + incumbent.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{BoundType, ColumnKind};

    #[test]
    fn test_integer_knapsack() {
        // max 5x + 4y, 6x + 4y <= 24, x + 2y <= 6, x, y integer
        // LP optimum (3, 1.5) = 21; integer optimum (4, 0) = 20
        let mut p = Problem::new("knapsack", Direction::Maximize);
        p.add_column("x");
        p.add_column("y");
        for (j, c) in [(1, 5.0), (2, 4.0)] {
            let column = p.column_mut(j).unwrap();
            column.objective = c;
            column.kind = ColumnKind::Integer;
        }
        p.add_row("a", [(1, 6.0), (2, 4.0)], BoundType::Upper, 0.0, 24.0).unwrap();
        p.add_row("b", [(1, 1.0), (2, 2.0)], BoundType::Upper, 0.0, 6.0).unwrap();

        let solution = BranchAndBound::new().solve(&p, &SolveConfig::default());
        assert_eq!(solution.status, Status::Optimal);
        assert!((solution.objective_value - 20.0).abs() < 1e-6, "{solution:?}");
        assert_eq!(solution.values, vec![4.0, 0.0]);
        assert!(solution.duals.is_none());
    }

    #[test]
    fn test_binary_infeasible() {
        // x binary, x >= 0.5 and x <= 0.7 has no integer point
        let mut p = Problem::new("bin", Direction::Minimize);
        p.add_column("x");
        let x = p.column_mut(1).unwrap();
        x.kind = ColumnKind::Binary;
        x.set_bounds(ColumnBounds::Explicit { lower: 0.0, upper: 1.0 });
        p.add_row("c", [(1, 1.0)], BoundType::Double, 0.5, 0.7).unwrap();

        let solution = BranchAndBound::new().solve(&p, &SolveConfig::default());
        assert_eq!(solution.status, Status::NoFeasible);
    }

    #[test]
    fn test_time_limit_without_incumbent() {
        let mut p = Problem::new("t", Direction::Minimize);
        p.add_column("x");
        p.column_mut(1).unwrap().kind = ColumnKind::Integer;
        let config = SolveConfig::default().with_time_limit(std::time::Duration::ZERO);
        let solution = BranchAndBound::new().solve(&p, &config);
        assert_eq!(solution.status, Status::Undefined);
    }
}
