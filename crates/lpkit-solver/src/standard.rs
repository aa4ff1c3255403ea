use crate::problem::{BoundType, Direction, Problem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// What a standard-form constraint stands for in the original problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// A row, 0-based
    Row(usize),
    /// The upper end of a double-bounded column, 0-based
    ColumnRange(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    pub origin: Origin,
    /// Coefficient per standard-form variable
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

/// How an original column is expressed in non-negative standard variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ColumnMap {
    /// x = offset + v
    Shifted { offset: f64, var: usize },
    /// x = offset - v
    Mirrored { offset: f64, var: usize },
    /// x = pos - neg
    Split { pos: usize, neg: usize },
    /// x = value
    Constant(f64),
}

/// `max c'v  s.t.  constraints, v >= 0` equivalent to a [`Problem`].
#[derive(Debug, Clone)]
pub(crate) struct StandardForm {
    pub num_vars: usize,
    /// Objective in maximization sense
    pub objective: Vec<f64>,
    pub constraints: Vec<Constraint>,
    pub columns: Vec<ColumnMap>,
    /// +1 when the original maximizes, -1 when it minimizes
    pub sense: f64,
    /// Row found infeasible while presolving, 0-based
    pub presolve_infeasible: Option<usize>,
}

impl StandardForm {
    pub fn from_problem(problem: &Problem, presolve: bool, tolerance: f64) -> Self {
        let sense = match problem.direction {
            Direction::Maximize => 1.0,
            Direction::Minimize => -1.0,
        };

        let mut num_vars = 0;
        let mut next_var = || {
            num_vars += 1;
            num_vars - 1
        };
        let mut ranges = Vec::new();
        let columns: Vec<ColumnMap> = problem
            .columns()
            .iter()
            .enumerate()
            .map(|(j, c)| match c.bound_type() {
                BoundType::Free => ColumnMap::Split {
                    pos: next_var(),
                    neg: next_var(),
                },
                BoundType::Lower => ColumnMap::Shifted {
                    offset: c.lower(),
                    var: next_var(),
                },
                BoundType::Upper => ColumnMap::Mirrored {
                    offset: c.upper(),
                    var: next_var(),
                },
                BoundType::Double => {
                    let var = next_var();
                    ranges.push((j, var, c.upper() - c.lower()));
                    ColumnMap::Shifted {
                        offset: c.lower(),
                        var,
                    }
                }
                BoundType::Fixed => ColumnMap::Constant(c.lower()),
            })
            .collect();

        let mut objective = vec![0.0; num_vars];
        for (column, map) in problem.columns().iter().zip(&columns) {
            let c = sense * column.objective;
            match *map {
                ColumnMap::Shifted { var, .. } => objective[var] += c,
                ColumnMap::Mirrored { var, .. } => objective[var] -= c,
                ColumnMap::Split { pos, neg } => {
                    objective[pos] += c;
                    objective[neg] -= c;
                }
                ColumnMap::Constant(_) => {}
            }
        }

        let mut constraints = Vec::new();
        let mut presolve_infeasible = None;
        for (i, row) in problem.rows().iter().enumerate() {
            if row.bound_type == BoundType::Free {
                continue;
            }

            let mut coefficients = vec![0.0; num_vars];
            let mut shift = 0.0;
            let mut empty = true;
            for (slot, a) in row.coefficients.iter() {
                if a != 0.0 {
                    empty = false;
                }
                match columns[slot - 1] {
                    ColumnMap::Shifted { offset, var } => {
                        coefficients[var] += a;
                        shift += a * offset;
                    }
                    ColumnMap::Mirrored { offset, var } => {
                        coefficients[var] -= a;
                        shift += a * offset;
                    }
                    ColumnMap::Split { pos, neg } => {
                        coefficients[pos] += a;
                        coefficients[neg] -= a;
                    }
                    ColumnMap::Constant(value) => shift += a * value,
                }
            }

            let (lower, upper) = row.effective_bounds();
            let (lower, upper) = (lower - shift, upper - shift);

            if presolve && empty {
                if lower > tolerance || upper < -tolerance {
                    presolve_infeasible.get_or_insert(i);
                }
                continue;
            }

            let mut push = |op, rhs| {
                constraints.push(Constraint {
                    origin: Origin::Row(i),
                    coefficients: coefficients.clone(),
                    op,
                    rhs,
                })
            };
            match row.bound_type {
                BoundType::Free => {}
                BoundType::Lower => push(ConstraintOp::Ge, lower),
                BoundType::Upper => push(ConstraintOp::Le, upper),
                BoundType::Double => {
                    push(ConstraintOp::Ge, lower);
                    push(ConstraintOp::Le, upper);
                }
                BoundType::Fixed => push(ConstraintOp::Eq, lower),
            }
        }

        for (j, var, width) in ranges {
            let mut coefficients = vec![0.0; num_vars];
            coefficients[var] = 1.0;
            constraints.push(Constraint {
                origin: Origin::ColumnRange(j),
                coefficients,
                op: ConstraintOp::Le,
                rhs: width,
            });
        }

        Self {
            num_vars,
            objective,
            constraints,
            columns,
            sense,
            presolve_infeasible,
        }
    }

    /// Map standard-form variable values back to original column values.
    pub fn recover(&self, v: &[f64]) -> Vec<f64> {
        self.columns
            .iter()
            .map(|map| match *map {
                ColumnMap::Shifted { offset, var } => offset + v[var],
                ColumnMap::Mirrored { offset, var } => offset - v[var],
                ColumnMap::Split { pos, neg } => v[pos] - v[neg],
                ColumnMap::Constant(value) => value,
            })
            .collect()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ColumnBounds;

    fn problem() -> Problem {
        let mut p = Problem::new("p", Direction::Minimize);
        for name in ["free", "lower", "upper", "double", "fixed"] {
            p.add_column(name);
        }
        let bounds = [
            (f64::NEG_INFINITY, f64::INFINITY),
            (1.0, f64::INFINITY),
            (f64::NEG_INFINITY, 4.0),
            (-2.0, 3.0),
            (7.0, 7.0),
        ];
        for (j, (lower, upper)) in bounds.into_iter().enumerate() {
            p.column_mut(j + 1)
                .unwrap()
                .set_bounds(ColumnBounds::Explicit { lower, upper });
            p.column_mut(j + 1).unwrap().objective = 1.0;
        }
        p
    }

    #[test]
    fn test_column_maps() {
        let form = StandardForm::from_problem(&problem(), true, 1e-9);
        assert_eq!(form.num_vars, 5);
        assert_eq!(form.columns[0], ColumnMap::Split { pos: 0, neg: 1 });
        assert_eq!(form.columns[4], ColumnMap::Constant(7.0));
        // only the double-bounded column needs a range constraint
        assert_eq!(form.num_constraints(), 1);
        assert_eq!(form.constraints[0].origin, Origin::ColumnRange(3));
        assert_eq!(form.constraints[0].rhs, 5.0);
        // minimization flips the objective
        assert_eq!(form.objective, vec![-1.0, 1.0, -1.0, 1.0, -1.0]);

        let values = form.recover(&[2.0, 0.5, 1.0, 1.0, 2.0]);
        assert_eq!(values, vec![1.5, 2.0, 3.0, 0.0, 7.0]);
    }

    #[test]
    fn test_row_shift_and_ops() {
        let mut p = problem();
        p.add_row("r", [(2, 1.0), (5, 2.0)], BoundType::Double, 20.0, 30.0)
            .unwrap();
        let form = StandardForm::from_problem(&p, true, 1e-9);
        // shift = 1*1 + 2*7 = 15
        let row: Vec<_> = form
            .constraints
            .iter()
            .filter(|c| c.origin == Origin::Row(0))
            .collect();
        assert_eq!(row.len(), 2);
        assert_eq!((row[0].op, row[0].rhs), (ConstraintOp::Ge, 5.0));
        assert_eq!((row[1].op, row[1].rhs), (ConstraintOp::Le, 15.0));
    }

    #[test]
    fn test_presolve_empty_rows() {
        let mut p = Problem::new("p", Direction::Minimize);
        p.add_column("x");
        p.add_row("ok", [(1, 0.0)], BoundType::Upper, 0.0, 1.0).unwrap();
        p.add_row("bad", [], BoundType::Lower, 2.0, 0.0).unwrap();
        let form = StandardForm::from_problem(&p, true, 1e-9);
        assert_eq!(form.num_constraints(), 0);
        assert_eq!(form.presolve_infeasible, Some(1));

        let form = StandardForm::from_problem(&p, false, 1e-9);
        assert_eq!(form.num_constraints(), 2);
        assert_eq!(form.presolve_infeasible, None);
    }
}
