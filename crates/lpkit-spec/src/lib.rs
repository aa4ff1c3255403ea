pub mod builder;
pub mod codec;
pub mod error;
pub mod lp_format;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod spec;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use builder::ModelBuilder;
pub use error::SpecError;
pub use lp_format::write_lp;
pub use orchestrator::{solve, solve_with_iteration_budget, Request};
pub use output::{Output, Values};
pub use registry::Registry;
pub use spec::{Bounds, ColumnBound, Constraint, Objective, Options, ProblemSpec, Term};
