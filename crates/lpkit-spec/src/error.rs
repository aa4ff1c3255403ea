use lpkit_solver::VectorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecError {
    /// The input text is not valid JSON.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },
    /// Well-formed input with a missing or invalid required field.
    #[error("malformed spec: `{field}` at {path}: expected {expected}")]
    Malformed {
        field: String,
        path: String,
        expected: &'static str,
    },
    #[error("encode error: {0}")]
    Encode(String),
    #[error(transparent)]
    Vector(#[from] VectorError),
}

impl SpecError {
    pub(crate) fn malformed(field: &str, path: &str, expected: &'static str) -> Self {
        SpecError::Malformed {
            field: field.to_string(),
            path: path.to_string(),
            expected,
        }
    }

    /// Name of the offending field, for malformed specs.
    pub fn field(&self) -> Option<&str> {
        match self {
            SpecError::Malformed { field, .. } => Some(field),
            _ => None,
        }
    }
}
