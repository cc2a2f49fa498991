use thiserror::Error;

/// Errors raised while building or querying a tableau.
///
/// Unbounded problems and iteration exhaustion are not errors; they are
/// reported through [`SolverStatus`](crate::SolverStatus). Constraint rows are
/// numbered from 1.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Dimension mismatch in {context}: expected {expected} coefficients, found {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },
    #[error("Constraint {row}: equality constraints are not supported")]
    EqualityUnsupported { row: usize },
    #[error(
        "Constraint {row}: right-hand side {rhs} gives no feasible starting basis (needs an artificial variable)"
    )]
    InfeasibleStart { row: usize, rhs: f64 },
    #[error("Tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
    #[error("Solution requested before the solver reached a terminal status")]
    NotTerminated,
}
