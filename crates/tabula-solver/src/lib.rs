mod error;
mod problem;
mod simplex;
mod solution;
mod tableau;

pub use error::SolverError;
pub use problem::{Constraint, ConstraintOp, LpProblem};
pub use simplex::{DUMP_PRECISION, Solver, TableauEngine};
pub use solution::{OptimalSolution, Solution, SolverStatus};
pub use tableau::{Matrix, Tableau, TableauDump};
