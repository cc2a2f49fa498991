use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::SolverError;
use crate::problem::{ConstraintOp, LpProblem};

/// Dense row-major matrix with fixed dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// `row[target] -= factor * row[source]`
    fn subtract_scaled_row(&mut self, target: usize, source: usize, factor: f64) {
        let cols = self.cols;
        let (t, s) = (target * cols, source * cols);
        for j in 0..cols {
            let value = self.data[s + j];
            self.data[t + j] -= factor * value;
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

/// Simplex tableau: row 0 is the objective row, rows `1..=m` are constraints,
/// the last column is the right-hand side.
#[derive(Debug, Clone)]
pub struct Tableau {
    data: Matrix,
    /// `basic_vars[i]` is the column basic in row `i + 1`
    basic_vars: Vec<usize>,
    non_basic_vars: Vec<usize>,
    n_vars: usize,
    n_aux: usize,
}

impl Tableau {
    /// Builds the initial tableau with an all-slack starting basis.
    ///
    /// Every constraint row contributes exactly one auxiliary column. A `>=`
    /// row can only start feasible when its right-hand side is non-positive;
    /// it is then stored negated so the surplus column is basic with a
    /// non-negative value.
    pub fn build(problem: &LpProblem, tolerance: f64) -> Result<Self, SolverError> {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        if problem.objective.len() != n_vars {
            return Err(SolverError::DimensionMismatch {
                context: "objective".to_string(),
                expected: n_vars,
                found: problem.objective.len(),
            });
        }

        let n_aux = n_constraints;
        let total_cols = n_vars + n_aux + 1;
        let rhs_col = total_cols - 1;
        let mut data = Matrix::zeros(n_constraints + 1, total_cols);

        for (j, &coef) in problem.objective.iter().enumerate() {
            data[(0, j)] = -coef;
        }

        let mut basic_vars = Vec::with_capacity(n_constraints);
        for (i, c) in problem.constraints.iter().enumerate() {
            let row = i + 1;
            if c.coefficients.len() != n_vars {
                return Err(SolverError::DimensionMismatch {
                    context: format!("constraint {}", row),
                    expected: n_vars,
                    found: c.coefficients.len(),
                });
            }

            let sign = match c.op {
                ConstraintOp::Le if c.rhs >= -tolerance => 1.0,
                ConstraintOp::Ge if c.rhs <= tolerance => -1.0,
                ConstraintOp::Le | ConstraintOp::Ge => {
                    return Err(SolverError::InfeasibleStart { row, rhs: c.rhs });
                }
                ConstraintOp::Eq => return Err(SolverError::EqualityUnsupported { row }),
            };

            let aux_col = n_vars + i;
            for (j, &coef) in c.coefficients.iter().enumerate() {
                data[(row, j)] = sign * coef;
            }
            // +1 slack for <=; the -1 surplus of a >= row flips to +1 with the row
            data[(row, aux_col)] = 1.0;
            data[(row, rhs_col)] = sign * c.rhs;
            basic_vars.push(aux_col);
        }

        let mut tableau = Self {
            data,
            basic_vars,
            non_basic_vars: Vec::new(),
            n_vars,
            n_aux,
        };
        tableau.refresh_non_basic();
        Ok(tableau)
    }

    fn refresh_non_basic(&mut self) {
        let basic = &self.basic_vars;
        self.non_basic_vars = (0..self.n_vars + self.n_aux)
            .filter(|j| !basic.contains(j))
            .collect();
    }

    pub fn data(&self) -> &Matrix {
        &self.data
    }

    pub fn basic_vars(&self) -> &[usize] {
        &self.basic_vars
    }

    pub fn non_basic_vars(&self) -> &[usize] {
        &self.non_basic_vars
    }

    pub fn num_variables(&self) -> usize {
        self.n_vars
    }

    pub fn num_constraints(&self) -> usize {
        self.data.rows() - 1
    }

    pub fn rhs_col(&self) -> usize {
        self.data.cols() - 1
    }

    pub fn objective_row(&self) -> &[f64] {
        self.data.row(0)
    }

    pub fn objective_value(&self) -> f64 {
        self.data[(0, self.rhs_col())]
    }

    /// Right-hand side of constraint row `i` (0-based, i.e. tableau row `i + 1`)
    pub fn rhs(&self, i: usize) -> f64 {
        self.data[(i + 1, self.rhs_col())]
    }

    /// Makes `col` basic in tableau row `row` by Gauss-Jordan elimination.
    pub(crate) fn pivot(&mut self, row: usize, col: usize) {
        self.basic_vars[row - 1] = col;
        self.refresh_non_basic();

        let pivot_val = self.data[(row, col)];
        for v in self.data.row_mut(row) {
            *v /= pivot_val;
        }

        for i in 0..self.data.rows() {
            if i != row {
                let factor = self.data[(i, col)];
                if factor != 0.0 {
                    self.data.subtract_scaled_row(i, row, factor);
                }
            }
        }
    }

    /// Human-readable rendering, rounded to `precision` decimals.
    pub fn dump(&self, precision: usize) -> TableauDump<'_> {
        TableauDump {
            tableau: self,
            precision,
        }
    }
}

pub struct TableauDump<'a> {
    tableau: &'a Tableau,
    precision: usize,
}

impl fmt::Display for TableauDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = &self.tableau.data;
        let p = self.precision;
        let width = data
            .data
            .iter()
            .map(|v| format!("{:.*}", p, round(*v, p)).len())
            .max()
            .unwrap_or(1);

        writeln!(f, "Tableau:")?;
        for i in 0..data.rows() {
            let cells: Vec<String> = data
                .row(i)
                .iter()
                .map(|v| format!("{:>width$.p$}", round(*v, p), width = width, p = p))
                .collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        writeln!(f, "Basic variables (indices): {:?}", self.tableau.basic_vars)?;
        writeln!(f, "Non-basic variables (indices): {:?}", self.tableau.non_basic_vars)?;
        write!(f, "{}", "-".repeat(30))
    }
}

/// Rounds and clears negative zero so `-0.0000` never shows up.
fn round(value: f64, precision: usize) -> f64 {
    let scale = 10f64.powi(precision as i32);
    let r = (value * scale).round() / scale;
    if r == 0.0 { 0.0 } else { r }
}
