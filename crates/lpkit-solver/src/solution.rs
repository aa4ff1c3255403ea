/// Solution status reported by the solve capability.
///
/// These are outcomes, not errors: every variant comes with whatever primal
/// values the solver had when it stopped.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "i32", try_from = "i32")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Solution is undefined
    Undefined = 1,
    /// Solution is feasible but not proven optimal
    Feasible = 2,
    /// Current solution is infeasible
    Infeasible = 3,
    /// No feasible solution exists
    NoFeasible = 4,
    /// Solution is optimal
    Optimal = 5,
    /// Problem is unbounded
    Unbounded = 6,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether an incremental solve should stop at this status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Optimal | Status::NoFeasible | Status::Unbounded | Status::Undefined
        )
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for Status {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Status::Undefined),
            2 => Ok(Status::Feasible),
            3 => Ok(Status::Infeasible),
            4 => Ok(Status::NoFeasible),
            5 => Ok(Status::Optimal),
            6 => Ok(Status::Unbounded),
            _ => Err(format!("unknown status code {code}")),
        }
    }
}

/// Raw result of solving a [`crate::Problem`].
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: Status,
    /// Objective value at `values`
    pub objective_value: f64,
    /// Primal value per column, in column index order
    pub values: Vec<f64>,
    /// Dual value per row, in row index order (LP only)
    pub duals: Option<Vec<f64>>,
    /// Simplex pivots performed
    pub iterations: usize,
}

impl Solution {
    /// A solution with every column at zero.
    pub fn undefined(num_columns: usize) -> Self {
        Self {
            status: Status::Undefined,
            objective_value: 0.0,
            values: vec![0.0; num_columns],
            duals: None,
            iterations: 0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == Status::Optimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_roundtrip() {
        for code in 1..=6 {
            let status = Status::try_from(code).unwrap();
            assert_eq!(i32::from(status), code);
        }
        assert!(Status::try_from(0).is_err());
        assert!(Status::try_from(7).is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(Status::Optimal.is_terminal());
        assert!(Status::Undefined.is_terminal());
        assert!(!Status::Feasible.is_terminal());
        assert!(!Status::Infeasible.is_terminal());
    }
}
