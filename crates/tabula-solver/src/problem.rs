/// A linear program in standard inequality form: maximize `c·x` subject to
/// `A·x {<=, >=} b` and `x >= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Number of decision variables
    pub num_variables: usize,
    /// Objective coefficients (maximization sense)
    pub objective: Vec<f64>,
    /// Constraint rows
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each decision variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=), gets a slack column
    Le,
    /// Greater than or equal (>=), gets a surplus column
    Ge,
    /// Equal (=). Recognized but rejected when the tableau is built.
    Eq,
}

impl LpProblem {
    pub fn new(num_variables: usize) -> Self {
        Self {
            num_variables,
            objective: vec![0.0; num_variables],
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective = coefficients;
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}
