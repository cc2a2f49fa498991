/// Lifecycle of a tableau engine. Everything except `Running` is terminal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Pivoting has not finished yet
    Running,
    /// An optimal solution was found
    Optimal,
    /// The objective can grow without bound
    Unbounded,
    /// The iteration cap was hit before a terminal status was reached
    IterationLimitExceeded,
}

impl SolverStatus {
    pub fn is_terminal(self) -> bool {
        self != SolverStatus::Running
    }
}

/// The result of solving an LP problem.
///
/// Only an optimal outcome carries numbers; the other outcomes are plain tags.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    Optimal(OptimalSolution),
    Unbounded,
    IterationLimitExceeded,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalSolution {
    /// Optimal values for each decision variable
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Whether another basis reaches the same objective value
    pub multiple_solutions: bool,
    /// Final basic column per constraint row
    pub basis: Vec<usize>,
    /// Pivots performed
    pub iterations: usize,
}

impl Solution {
    pub fn status(&self) -> SolverStatus {
        match self {
            Solution::Optimal(_) => SolverStatus::Optimal,
            Solution::Unbounded => SolverStatus::Unbounded,
            Solution::IterationLimitExceeded => SolverStatus::IterationLimitExceeded,
        }
    }

    pub fn optimal(&self) -> Option<&OptimalSolution> {
        match self {
            Solution::Optimal(s) => Some(s),
            _ => None,
        }
    }
}
