mod backend;
mod branch;
mod config;
mod problem;
mod simplex;
mod solution;
mod sparse;
mod standard;

pub use backend::{Backend, LpSession, SimplexSession, Solver, VERSION};
pub use branch::BranchAndBound;
pub use config::{MessageLevel, SolveConfig, SolveKind};
pub use problem::{normalize, BoundType, Column, ColumnBounds, ColumnKind, Direction, Problem, Row};
pub use solution::{Solution, Status};
pub use sparse::{SparseVector, VectorError};
