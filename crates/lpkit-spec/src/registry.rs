use std::collections::HashMap;

use lpkit_solver::{BoundType, Problem, VectorError};

/// Name-to-index maps for the columns and rows of one [`Problem`].
///
/// Owned by a single build; indices are 1-based and follow insertion order.
#[derive(Debug, Default)]
pub struct Registry {
    columns: HashMap<String, usize>,
    rows: HashMap<String, Vec<usize>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the column called `name`, adding an unset column on first use.
    pub fn resolve_column(&mut self, problem: &mut Problem, name: &str) -> usize {
        if let Some(&j) = self.columns.get(name) {
            return j;
        }
        let j = problem.add_column(name);
        self.columns.insert(name.to_string(), j);
        j
    }

    /// Append a new row. Repeated names produce distinct rows.
    pub fn declare_row(
        &mut self,
        problem: &mut Problem,
        name: &str,
        terms: Vec<(usize, f64)>,
        bound_type: BoundType,
        lower: f64,
        upper: f64,
    ) -> Result<usize, VectorError> {
        let i = problem.add_row(name, terms, bound_type, lower, upper)?;
        self.rows.entry(name.to_string()).or_default().push(i);
        Ok(i)
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Every row declared under `name`, in declaration order.
    pub fn find_rows(&self, name: &str) -> &[usize] {
        self.rows.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
