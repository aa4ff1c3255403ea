//! Turns a [`ProblemSpec`] into an index-addressed [`Problem`].

use lpkit_solver::{ColumnBounds, ColumnKind, Problem};
use tracing::{debug, info};

use crate::error::SpecError;
use crate::registry::Registry;
use crate::spec::{ColumnBound, Constraint, ProblemSpec, Term};

/// Builds one [`Problem`]. Each build owns a fresh [`Registry`].
pub struct ModelBuilder {
    problem: Problem,
    registry: Registry,
}

impl ModelBuilder {
    pub fn new(spec: &ProblemSpec) -> Self {
        Self {
            problem: Problem::new(spec.name.as_str(), spec.objective.direction),
            registry: Registry::new(),
        }
    }

    /// Build the complete model for `spec`.
    pub fn build(spec: &ProblemSpec) -> Result<Problem, SpecError> {
        let mut builder = ModelBuilder::new(spec);
        builder.objective(&spec.objective.vars);
        for constraint in &spec.subject_to {
            builder.constraint(constraint)?;
        }
        for bound in &spec.bounds {
            builder.column_bound(bound);
        }
        for name in &spec.generals {
            builder.kind(name, ColumnKind::Integer);
        }
        for name in &spec.binaries {
            builder.kind(name, ColumnKind::Binary);
        }
        Ok(builder.finish())
    }

    /// Objective columns get their coefficient and the unset bound pair.
    fn objective(&mut self, terms: &[Term]) {
        for term in terms {
            let j = self.registry.resolve_column(&mut self.problem, &term.name);
            if let Some(column) = self.problem.column_mut(j) {
                column.objective = term.coef;
                column.set_bounds(ColumnBounds::Unset);
            }
        }
    }

    fn constraint(&mut self, constraint: &Constraint) -> Result<usize, SpecError> {
        let terms: Vec<(usize, f64)> = constraint
            .vars
            .iter()
            .map(|t| (self.registry.resolve_column(&mut self.problem, &t.name), t.coef))
            .collect();
        let bnds = constraint.bnds;
        let i = self.registry.declare_row(
            &mut self.problem,
            &constraint.name,
            terms,
            bnds.bound_type,
            bnds.lb,
            bnds.ub,
        )?;
        Ok(i)
    }

    fn column_bound(&mut self, bound: &ColumnBound) {
        let j = self.registry.resolve_column(&mut self.problem, &bound.name);
        let (lower, upper) = bound.bnds.bound_type.apply(bound.bnds.lb, bound.bnds.ub);
        if let Some(column) = self.problem.column_mut(j) {
            column.set_bounds(ColumnBounds::Explicit { lower, upper });
        }
    }

    fn kind(&mut self, name: &str, kind: ColumnKind) {
        let j = self.registry.resolve_column(&mut self.problem, name);
        if let Some(column) = self.problem.column_mut(j) {
            column.kind = kind;
            if kind == ColumnKind::Binary {
                column.set_bounds(ColumnBounds::Explicit {
                    lower: 0.0,
                    upper: 1.0,
                });
            }
        }
    }

    /// Classify every column's bounds and hand the problem over.
    fn finish(mut self) -> Problem {
        self.problem.finalize_bounds();
        for column in self.problem.columns() {
            debug!(
                column = %column.name,
                bound_type = ?column.bound_type(),
                lower = column.lower(),
                upper = column.upper(),
                "column classified"
            );
        }
        info!(
            rows = self.problem.num_rows(),
            columns = self.problem.num_columns(),
            nonzeros = self.problem.num_nonzeros(),
            integer = self.problem.num_integer(),
            binary = self.problem.num_binary(),
            "model built"
        );
        self.problem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpkit_solver::{BoundType, Direction};
    use serde_json::json;

    const INF: f64 = f64::INFINITY;

    fn build(value: serde_json::Value) -> Problem {
        ModelBuilder::build(&ProblemSpec::from_value(&value).unwrap()).unwrap()
    }

    #[test]
    fn test_objective_columns_default_to_lower() {
        let problem = build(json!({
            "name": "a",
            "objective": { "direction": 2, "vars": [{ "name": "x", "coef": 3 }, { "name": "y", "coef": 2 }] },
            "subjectTo": [{
                "name": "cap",
                "vars": [{ "name": "x", "coef": 1 }, { "name": "y", "coef": 1 }],
                "bnds": { "type": 3, "lb": -1.7976931348623157e308, "ub": 4 }
            }]
        }));
        assert_eq!(problem.name, "a");
        assert_eq!(problem.direction, Direction::Maximize);
        for column in problem.columns() {
            assert_eq!(column.bound_type(), BoundType::Lower);
            assert_eq!((column.lower(), column.upper()), (0.0, INF));
        }
        let row = problem.row(1).unwrap();
        assert_eq!(row.bound_type, BoundType::Upper);
        assert_eq!(row.upper, 4.0);
        assert_eq!(row.coefficients.get(2).unwrap(), 1.0);
    }

    #[test]
    fn test_constraint_only_column_is_created() {
        let problem = build(json!({
            "objective": { "direction": 1, "vars": [{ "name": "x", "coef": 1 }] },
            "subjectTo": [{
                "name": "link",
                "vars": [{ "name": "x", "coef": 1 }, { "name": "aux", "coef": -1 }],
                "bnds": { "type": 5, "lb": 0, "ub": 0 }
            }]
        }));
        assert_eq!(problem.num_columns(), 2);
        let aux = problem.column(2).unwrap();
        assert_eq!(aux.name, "aux");
        assert_eq!(aux.objective, 0.0);
        assert_eq!(aux.bound_type(), BoundType::Lower);
    }

    #[test]
    fn test_inverted_bounds_are_kept() {
        let problem = build(json!({
            "objective": { "direction": 1, "vars": [{ "name": "x", "coef": 1 }] },
            "subjectTo": [{
                "name": "r",
                "vars": [{ "name": "x", "coef": 1 }],
                "bnds": { "type": 4, "lb": 5, "ub": 1 }
            }],
            "bounds": [{ "name": "x", "type": 4, "lb": 5, "ub": 1 }]
        }));
        let row = problem.row(1).unwrap();
        assert_eq!(row.bound_type, BoundType::Double);
        assert_eq!((row.lower, row.upper), (5.0, 1.0));
        let x = problem.column(1).unwrap();
        assert_eq!(x.bound_type(), BoundType::Double);
        assert_eq!((x.lower(), x.upper()), (5.0, 1.0));
    }

    #[test]
    fn test_bounds_section_and_kinds() {
        let problem = build(json!({
            "objective": { "direction": 1, "vars": [
                { "name": "free", "coef": 1 },
                { "name": "up", "coef": 1 },
                { "name": "fixed", "coef": 1 }
            ] },
            "subjectTo": [],
            "bounds": [
                { "name": "free", "type": 1, "lb": 3, "ub": 4 },
                { "name": "up", "type": 3, "lb": 2, "ub": 8 },
                { "name": "fixed", "type": 5, "lb": 6, "ub": 9 },
                { "name": "late", "type": 2, "lb": -1 }
            ],
            "generals": ["up"],
            "binaries": ["flag"]
        }));
        let column = |j: usize| problem.column(j).unwrap();
        assert_eq!(column(1).bound_type(), BoundType::Free);
        assert_eq!(column(2).bound_type(), BoundType::Upper);
        assert_eq!(column(2).upper(), 8.0);
        assert_eq!(column(2).kind, ColumnKind::Integer);
        assert_eq!(column(3).bound_type(), BoundType::Fixed);
        assert_eq!(column(3).upper(), 6.0);
        assert_eq!(column(4).name, "late");
        assert_eq!(column(4).lower(), -1.0);
        assert_eq!(column(5).name, "flag");
        assert_eq!(column(5).kind, ColumnKind::Binary);
        assert_eq!(column(5).bound_type(), BoundType::Double);
        assert_eq!(problem.num_integer(), 2);
    }

    #[test]
    fn test_repeated_term_accumulates() {
        let problem = build(json!({
            "objective": { "direction": 1, "vars": [] },
            "subjectTo": [{
                "name": "c",
                "vars": [{ "name": "x", "coef": 1 }, { "name": "x", "coef": 2.5 }],
                "bnds": { "type": 2, "lb": 1 }
            }]
        }));
        let row = problem.row(1).unwrap();
        assert_eq!(row.coefficients.nnz(), 1);
        assert_eq!(row.coefficients.get(1).unwrap(), 3.5);
    }
}
