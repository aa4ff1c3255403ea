use crate::sparse::{SparseVector, VectorError};

/// Optimization direction, with the numeric codes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize = 1,
    Maximize = 2,
}

impl Direction {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Direction::Minimize),
            2 => Some(Direction::Maximize),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Feasible-range classification of a column or row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundType {
    /// No lower, no upper bound
    Free = 1,
    /// Lower bound only
    Lower = 2,
    /// Upper bound only
    Upper = 3,
    /// Both bounds, lower != upper
    Double = 4,
    /// lower == upper
    Fixed = 5,
}

impl BoundType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(BoundType::Free),
            2 => Some(BoundType::Lower),
            3 => Some(BoundType::Upper),
            4 => Some(BoundType::Double),
            5 => Some(BoundType::Fixed),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Classify a raw `(lower, upper)` pair. The unset sentinels
    /// (`lower = +inf`, `upper = -inf`) are normalized first, see [`normalize`].
    pub fn classify(lower: f64, upper: f64) -> BoundType {
        let (lower, upper) = normalize(lower, upper);
        if lower == f64::NEG_INFINITY && upper == f64::INFINITY {
            BoundType::Free
        } else if upper == f64::INFINITY {
            BoundType::Lower
        } else if lower == f64::NEG_INFINITY {
            BoundType::Upper
        } else if lower != upper {
            BoundType::Double
        } else {
            BoundType::Fixed
        }
    }

    /// Interpret `(lower, upper)` under this type: components the type does
    /// not use are replaced with the matching infinity.
    pub fn apply(self, lower: f64, upper: f64) -> (f64, f64) {
        match self {
            BoundType::Free => (f64::NEG_INFINITY, f64::INFINITY),
            BoundType::Lower => (lower, f64::INFINITY),
            BoundType::Upper => (f64::NEG_INFINITY, upper),
            BoundType::Double => (lower, upper),
            BoundType::Fixed => (lower, lower),
        }
    }
}

/// Replace the unset sentinels: `lower = +inf` becomes `0`, `upper = -inf` becomes `+inf`.
pub fn normalize(lower: f64, upper: f64) -> (f64, f64) {
    let lower = if lower == f64::INFINITY { 0.0 } else { lower };
    let upper = if upper == f64::NEG_INFINITY { f64::INFINITY } else { upper };
    (lower, upper)
}

/// Column bounds before classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnBounds {
    /// Never set; resolves to `[0, +inf)`
    Unset,
    Explicit { lower: f64, upper: f64 },
}

impl ColumnBounds {
    /// Translate a raw pair from the wire, where `(+inf, -inf)` means unset.
    pub fn from_raw(lower: f64, upper: f64) -> Self {
        if lower == f64::INFINITY && upper == f64::NEG_INFINITY {
            ColumnBounds::Unset
        } else {
            let (lower, upper) = normalize(lower, upper);
            ColumnBounds::Explicit { lower, upper }
        }
    }

    pub fn resolve(self) -> (f64, f64) {
        match self {
            ColumnBounds::Unset => (0.0, f64::INFINITY),
            ColumnBounds::Explicit { lower, upper } => (lower, upper),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    #[default]
    Continuous,
    Integer,
    Binary,
}

impl ColumnKind {
    pub fn is_integer(self) -> bool {
        !matches!(self, ColumnKind::Continuous)
    }
}

/// A decision variable.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub objective: f64,
    pub kind: ColumnKind,
    bounds: ColumnBounds,
    bound_type: BoundType,
}

impl Column {
    fn new(name: String) -> Self {
        Self {
            name,
            objective: 0.0,
            kind: ColumnKind::Continuous,
            bounds: ColumnBounds::Unset,
            bound_type: BoundType::Lower,
        }
    }

    pub fn bounds(&self) -> ColumnBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: ColumnBounds) {
        self.bounds = bounds;
        let (lower, upper) = bounds.resolve();
        self.bound_type = BoundType::classify(lower, upper);
    }

    pub fn bound_type(&self) -> BoundType {
        self.bound_type
    }

    pub fn lower(&self) -> f64 {
        self.bounds.resolve().0
    }

    pub fn upper(&self) -> f64 {
        self.bounds.resolve().1
    }
}

/// A linear constraint `lower <= a'x <= upper`, interpreted per `bound_type`.
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub coefficients: SparseVector,
    pub bound_type: BoundType,
    pub lower: f64,
    pub upper: f64,
}

impl Row {
    /// `(lower, upper)` with unused sides replaced by infinities.
    pub fn effective_bounds(&self) -> (f64, f64) {
        self.bound_type.apply(self.lower, self.upper)
    }

    /// Activity `a'x` for a full column-value vector (0-based).
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .map(|(j, coef)| coef * values.get(j - 1).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Index-addressed optimization problem. Column and row indices are 1-based.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub direction: Direction,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Problem {
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append an unset column and return its index.
    pub fn add_column(&mut self, name: impl Into<String>) -> usize {
        self.columns.push(Column::new(name.into()));
        self.columns.len()
    }

    /// Append a row whose coefficients are accumulated from `(column, coef)`
    /// pairs. Every referenced column must already exist.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (usize, f64)>,
        bound_type: BoundType,
        lower: f64,
        upper: f64,
    ) -> Result<usize, VectorError> {
        let coefficients = SparseVector::from_pairs(self.columns.len(), terms)?;
        self.rows.push(Row {
            name: name.into(),
            coefficients,
            bound_type,
            lower,
            upper,
        });
        Ok(self.rows.len())
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        index.checked_sub(1).and_then(|j| self.columns.get(j))
    }

    pub fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        index.checked_sub(1).and_then(|j| self.columns.get_mut(j))
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        index.checked_sub(1).and_then(|i| self.rows.get(i))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_nonzeros(&self) -> usize {
        self.rows.iter().map(|r| r.coefficients.nnz()).sum()
    }

    pub fn num_integer(&self) -> usize {
        self.columns.iter().filter(|c| c.kind.is_integer()).count()
    }

    pub fn num_binary(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Binary)
            .count()
    }

    /// Resolve every column's bounds to explicit values and reclassify them.
    pub fn finalize_bounds(&mut self) {
        for column in &mut self.columns {
            let (lower, upper) = column.bounds.resolve();
            column.set_bounds(ColumnBounds::Explicit { lower, upper });
        }
    }

    /// Objective value `c'x` for a full column-value vector (0-based).
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(values)
            .map(|(c, x)| c.objective * x)
            .sum()
    }
}
