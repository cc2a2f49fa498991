use log::{debug, info, trace};

use crate::error::SolverError;
use crate::problem::LpProblem;
use crate::solution::{OptimalSolution, Solution, SolverStatus};
use crate::tableau::{Tableau, TableauDump};

/// Decimals used when dumping a tableau for tracing
pub const DUMP_PRECISION: usize = 4;

/// Simplex solver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solver {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons against zero
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Builds the initial tableau for `problem` without pivoting.
    pub fn engine(&self, problem: &LpProblem) -> Result<TableauEngine, SolverError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SolverError::InvalidTolerance(self.tolerance));
        }
        let tableau = Tableau::build(problem, self.tolerance)?;
        debug!(
            "built {}x{} tableau for {} variables and {} constraints",
            tableau.data().rows(),
            tableau.data().cols(),
            problem.num_variables(),
            problem.num_constraints()
        );
        Ok(TableauEngine {
            tableau,
            config: *self,
            status: SolverStatus::Running,
            multiple_solutions: false,
            iterations: 0,
        })
    }

    /// Builds the tableau, pivots to a terminal status and extracts the result.
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        let mut engine = self.engine(problem)?;
        engine.solve();
        engine.solution()
    }
}

/// Primal simplex state machine over one owned tableau.
#[derive(Debug, Clone)]
pub struct TableauEngine {
    tableau: Tableau,
    config: Solver,
    status: SolverStatus,
    multiple_solutions: bool,
    iterations: usize,
}

impl TableauEngine {
    /// Pivots until a terminal status is reached.
    pub fn solve(&mut self) -> SolverStatus {
        while self.step() == SolverStatus::Running {}
        info!(
            "simplex finished with {:?} after {} iterations",
            self.status, self.iterations
        );
        self.status
    }

    /// Runs one pass of the simplex loop: optimality test, entering column,
    /// unboundedness test, ratio test, pivot.
    ///
    /// Does nothing once the status is terminal.
    pub fn step(&mut self) -> SolverStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        if self.iterations >= self.config.max_iterations {
            self.status = SolverStatus::IterationLimitExceeded;
            return self.status;
        }

        let Some(col) = self.find_pivot_column() else {
            self.status = SolverStatus::Optimal;
            self.check_multiple_solutions();
            return self.status;
        };

        let Some(row) = self.find_pivot_row(col) else {
            debug!("column {} has no positive entry, problem is unbounded", col);
            self.status = SolverStatus::Unbounded;
            return self.status;
        };

        self.iterations += 1;
        debug!(
            "iteration {}: column {} enters, row {} leaves (basic {}), pivot {}",
            self.iterations,
            col,
            row,
            self.tableau.basic_vars()[row - 1],
            self.tableau.data()[(row, col)]
        );
        self.tableau.pivot(row, col);
        debug!("objective value now {}", self.tableau.objective_value());
        trace!("\n{}", self.dump());

        self.status
    }

    /// Most negative objective-row coefficient, lowest index on ties.
    /// `None` when every coefficient is within tolerance of non-negative.
    fn find_pivot_column(&self) -> Option<usize> {
        let obj = &self.tableau.objective_row()[..self.tableau.rhs_col()];
        let tol = self.config.tolerance;

        if obj.iter().all(|&v| v >= -tol) {
            return None;
        }

        let mut min_val = f64::INFINITY;
        let mut min_col = None;
        for (j, &v) in obj.iter().enumerate() {
            if v < min_val {
                min_val = v;
                min_col = Some(j);
            }
        }
        min_col
    }

    /// Minimum-ratio test over rows with a positive entry in `col`, lowest row
    /// on ties. Returns the tableau row (1-based; row 0 is the objective).
    fn find_pivot_row(&self, col: usize) -> Option<usize> {
        let data = self.tableau.data();
        let rhs_col = self.tableau.rhs_col();
        let tol = self.config.tolerance;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;
        for i in 1..data.rows() {
            let val = data[(i, col)];
            if val > tol {
                let ratio = data[(i, rhs_col)] / val;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }
        min_row
    }

    fn check_multiple_solutions(&mut self) {
        let obj = self.tableau.objective_row();
        let tol = self.config.tolerance;
        if let Some(&j) = self
            .tableau
            .non_basic_vars()
            .iter()
            .find(|&&j| obj[j].abs() < tol)
        {
            debug!("non-basic column {} has zero reduced cost, optimum is not unique", j);
            self.multiple_solutions = true;
        }
    }

    /// Reads the result. Pure, so repeated calls return the same value.
    pub fn solution(&self) -> Result<Solution, SolverError> {
        match self.status {
            SolverStatus::Running => Err(SolverError::NotTerminated),
            SolverStatus::Unbounded => Ok(Solution::Unbounded),
            SolverStatus::IterationLimitExceeded => Ok(Solution::IterationLimitExceeded),
            SolverStatus::Optimal => {
                let n_vars = self.tableau.num_variables();
                let mut values = vec![0.0; n_vars];
                for (i, &basic) in self.tableau.basic_vars().iter().enumerate() {
                    if basic < n_vars {
                        values[basic] = self.tableau.rhs(i);
                    }
                }
                Ok(Solution::Optimal(OptimalSolution {
                    values,
                    objective_value: self.tableau.objective_value(),
                    multiple_solutions: self.multiple_solutions,
                    basis: self.tableau.basic_vars().to_vec(),
                    iterations: self.iterations,
                }))
            }
        }
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn multiple_solutions(&self) -> bool {
        self.multiple_solutions
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    pub fn dump(&self) -> TableauDump<'_> {
        self.tableau.dump(DUMP_PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ConstraintOp;

    const EPS: f64 = 1e-9;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn problem(objective: Vec<f64>, rows: &[(&[f64], ConstraintOp, f64)]) -> LpProblem {
        let mut problem = LpProblem::new(objective.len());
        problem.set_objective(objective);
        for (coefs, op, rhs) in rows {
            problem.add_constraint(coefs.to_vec(), *op, *rhs);
        }
        problem
    }

    fn assert_basis_canonical(engine: &TableauEngine) {
        let tableau = engine.tableau();
        let data = tableau.data();
        for (i, &basic) in tableau.basic_vars().iter().enumerate() {
            for r in 1..data.rows() {
                let expected = if r == i + 1 { 1.0 } else { 0.0 };
                assert!(
                    (data[(r, basic)] - expected).abs() < EPS,
                    "column {} at row {} is {} (expected {})",
                    basic,
                    r,
                    data[(r, basic)],
                    expected
                );
            }
        }
        let mut all: Vec<usize> = tableau
            .basic_vars()
            .iter()
            .chain(tableau.non_basic_vars())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..data.cols() - 1).collect::<Vec<_>>());
        assert!(tableau.non_basic_vars().windows(2).all(|w| w[0] < w[1]));
    }

    fn assert_feasible(engine: &TableauEngine) {
        let tableau = engine.tableau();
        for i in 0..tableau.num_constraints() {
            assert!(tableau.rhs(i) >= -EPS, "row {} rhs {}", i + 1, tableau.rhs(i));
        }
    }

    /// Steps one pivot at a time, checking invariants after each.
    fn run_checked(solver: &Solver, problem: &LpProblem) -> TableauEngine {
        let mut engine = solver.engine(problem).unwrap();
        assert_basis_canonical(&engine);
        assert_feasible(&engine);
        while engine.step() == SolverStatus::Running {
            assert_basis_canonical(&engine);
            assert_feasible(&engine);
        }
        engine
    }

    #[test]
    fn test_textbook_maximization() {
        init();
        // Maximize: 3x1 + 2x2
        //   2x1 + x2 <= 10
        //   x1 + 3x2 <= 15
        // Optimal: x1=3, x2=4, obj=17
        let problem = problem(
            vec![3.0, 2.0],
            &[
                (&[2.0, 1.0], ConstraintOp::Le, 10.0),
                (&[1.0, 3.0], ConstraintOp::Le, 15.0),
            ],
        );
        let engine = run_checked(&Solver::new(), &problem);
        assert_eq!(engine.status(), SolverStatus::Optimal);
        assert_eq!(engine.iterations(), 2);

        let solution = engine.solution().unwrap();
        let optimal = solution.optimal().unwrap();
        assert!((optimal.values[0] - 3.0).abs() < EPS, "x1 = {}", optimal.values[0]);
        assert!((optimal.values[1] - 4.0).abs() < EPS, "x2 = {}", optimal.values[1]);
        assert!((optimal.objective_value - 17.0).abs() < EPS);
        assert!(!optimal.multiple_solutions);
        assert_eq!(optimal.basis, vec![0, 1]);
    }

    #[test]
    fn test_optimal_objective_row_is_non_negative() {
        let problem = problem(
            vec![3.0, 2.0],
            &[
                (&[1.0, 1.0], ConstraintOp::Le, 4.0),
                (&[1.0, 0.0], ConstraintOp::Le, 3.0),
                (&[0.0, 1.0], ConstraintOp::Le, 3.0),
            ],
        );
        let engine = run_checked(&Solver::new(), &problem);
        assert_eq!(engine.status(), SolverStatus::Optimal);
        let tableau = engine.tableau();
        let obj = &tableau.objective_row()[..tableau.rhs_col()];
        assert!(obj.iter().all(|&v| v >= -EPS));

        let optimal = engine.solution().unwrap();
        let optimal = optimal.optimal().unwrap();
        assert!((optimal.values[0] - 3.0).abs() < EPS);
        assert!((optimal.values[1] - 1.0).abs() < EPS);
        assert!((optimal.objective_value - 11.0).abs() < EPS);
    }

    #[test]
    fn test_unbounded() {
        init();
        // Maximize x1 subject to x1 >= 0 only
        let problem = problem(vec![1.0], &[(&[1.0], ConstraintOp::Ge, 0.0)]);
        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution, Solution::Unbounded);
        assert_eq!(solution.status(), SolverStatus::Unbounded);
        assert!(solution.optimal().is_none());
    }

    #[test]
    fn test_unbounded_direction_with_bounded_variable() {
        let problem = problem(
            vec![1.0, 1.0],
            &[(&[1.0, -1.0], ConstraintOp::Le, 2.0)],
        );
        let engine = run_checked(&Solver::new(), &problem);
        assert_eq!(engine.status(), SolverStatus::Unbounded);
    }

    #[test]
    fn test_tied_ratio_terminates() {
        init();
        // x1 <= 4 twice: both rows tie in the ratio test
        let problem = problem(
            vec![1.0],
            &[
                (&[1.0], ConstraintOp::Le, 4.0),
                (&[1.0], ConstraintOp::Le, 4.0),
            ],
        );
        let engine = run_checked(&Solver::new(), &problem);
        assert_eq!(engine.status(), SolverStatus::Optimal);
        let solution = engine.solution().unwrap();
        let optimal = solution.optimal().unwrap();
        assert!((optimal.values[0] - 4.0).abs() < EPS);
        assert!((optimal.objective_value - 4.0).abs() < EPS);
        // lowest row wins the tie
        assert_eq!(optimal.basis, vec![0, 2]);
    }

    #[test]
    fn test_multiple_optima() {
        // Maximize x1 + x2 subject to x1 + x2 <= 10
        let problem = problem(vec![1.0, 1.0], &[(&[1.0, 1.0], ConstraintOp::Le, 10.0)]);
        let engine = run_checked(&Solver::new(), &problem);
        assert_eq!(engine.status(), SolverStatus::Optimal);
        assert!(engine.multiple_solutions());

        let solution = engine.solution().unwrap();
        let optimal = solution.optimal().unwrap();
        assert!(optimal.multiple_solutions);
        assert!((optimal.objective_value - 10.0).abs() < EPS);
        assert!((optimal.values[0] - 10.0).abs() < EPS);
        assert_eq!(optimal.values[1], 0.0);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let problem = problem(
            vec![3.0, 2.0],
            &[
                (&[2.0, 1.0], ConstraintOp::Le, 10.0),
                (&[1.0, 3.0], ConstraintOp::Le, 15.0),
            ],
        );
        let mut engine = Solver::new().engine(&problem).unwrap();
        engine.solve();
        let first = engine.solution().unwrap();
        let second = engine.solution().unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.step(), SolverStatus::Optimal);
        assert_eq!(engine.solution().unwrap(), first);
    }

    #[test]
    fn test_solution_before_solve_is_an_error() {
        let problem = problem(vec![1.0], &[(&[1.0], ConstraintOp::Le, 1.0)]);
        let engine = Solver::new().engine(&problem).unwrap();
        assert_eq!(engine.status(), SolverStatus::Running);
        assert_eq!(engine.solution(), Err(SolverError::NotTerminated));
    }

    #[test]
    fn test_iteration_limit() {
        let problem = problem(
            vec![3.0, 2.0],
            &[
                (&[2.0, 1.0], ConstraintOp::Le, 10.0),
                (&[1.0, 3.0], ConstraintOp::Le, 15.0),
            ],
        );
        let solver = Solver::new().with_max_iterations(1);
        let mut engine = solver.engine(&problem).unwrap();
        assert_eq!(engine.solve(), SolverStatus::IterationLimitExceeded);
        assert_eq!(engine.iterations(), 1);
        assert_eq!(engine.solution().unwrap(), Solution::IterationLimitExceeded);
    }

    #[test]
    fn test_zero_cap_precedes_optimality_test() {
        // Minimizing-style objective: the all-slack start is already optimal
        let problem = problem(vec![-1.0, -2.0], &[(&[1.0, 1.0], ConstraintOp::Le, 5.0)]);
        let solver = Solver::new().with_max_iterations(0);
        let mut engine = solver.engine(&problem).unwrap();
        // The cap is checked before the optimality test
        assert_eq!(engine.solve(), SolverStatus::IterationLimitExceeded);

        let solution = Solver::new().solve(&problem).unwrap();
        let optimal = solution.optimal().unwrap();
        assert_eq!(optimal.iterations, 0);
        assert_eq!(optimal.values, vec![0.0, 0.0]);
        assert_eq!(optimal.objective_value, 0.0);
        assert!(!optimal.multiple_solutions);
    }

    #[test]
    fn test_tolerance_controls_optimality() {
        let problem = problem(vec![1e-6], &[(&[1.0], ConstraintOp::Le, 1.0)]);

        let strict = Solver::new().solve(&problem).unwrap();
        let strict = strict.optimal().unwrap();
        assert!((strict.values[0] - 1.0).abs() < EPS);

        let loose = Solver::new().with_tolerance(1e-3).solve(&problem).unwrap();
        let loose = loose.optimal().unwrap();
        assert_eq!(loose.values[0], 0.0);
        assert!(loose.multiple_solutions);
    }

    #[test]
    fn test_invalid_tolerance_is_rejected() {
        let problem = problem(
            vec![3.0, 2.0],
            &[
                (&[2.0, 1.0], ConstraintOp::Le, 10.0),
                (&[1.0, 3.0], ConstraintOp::Le, 15.0),
            ],
        );
        assert_eq!(
            Solver::new().with_tolerance(-1.0).solve(&problem),
            Err(SolverError::InvalidTolerance(-1.0))
        );
        assert!(matches!(
            Solver::new().with_tolerance(f64::NAN).engine(&problem),
            Err(SolverError::InvalidTolerance(t)) if t.is_nan()
        ));
        assert!(matches!(
            Solver::new().with_tolerance(f64::INFINITY).engine(&problem),
            Err(SolverError::InvalidTolerance(_))
        ));

        let exact = Solver::new().with_tolerance(0.0).solve(&problem).unwrap();
        assert!((exact.optimal().unwrap().objective_value - 17.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_zero_rhs() {
        init();
        // x2 is pinned at zero by a degenerate row
        let problem = problem(
            vec![2.0, 1.0],
            &[
                (&[1.0, 1.0], ConstraintOp::Le, 6.0),
                (&[0.0, 1.0], ConstraintOp::Le, 0.0),
                (&[1.0, 0.0], ConstraintOp::Le, 4.0),
            ],
        );
        let engine = run_checked(&Solver::new(), &problem);
        assert_eq!(engine.status(), SolverStatus::Optimal);
        let solution = engine.solution().unwrap();
        let optimal = solution.optimal().unwrap();
        assert!((optimal.values[0] - 4.0).abs() < EPS);
        assert!(optimal.values[1].abs() < EPS);
        assert!((optimal.objective_value - 8.0).abs() < EPS);
    }

    #[test]
    fn test_construction_errors_propagate() {
        let problem = problem(vec![1.0], &[(&[1.0], ConstraintOp::Eq, 3.0)]);
        assert_eq!(
            Solver::new().solve(&problem),
            Err(SolverError::EqualityUnsupported { row: 1 })
        );
    }
}
