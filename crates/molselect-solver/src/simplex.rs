use crate::problem::{ConstraintOp, Model};
use crate::solution::Solution;

/// Two-phase simplex for the continuous relaxation of a [`Model`].
///
/// Integrality is ignored; variable bounds are added as explicit rows.
/// Pivoting follows Bland's rule so degenerate relaxations cannot cycle.
#[derive(Debug, Clone)]
pub struct Simplex {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Simplex {
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

    /// Solve the relaxation using each variable's declared domain.
    pub fn solve(&self, model: &Model) -> Solution {
        let (lower, upper): (Vec<f64>, Vec<f64>) = model.variables.iter().map(|v| v.kind.bounds()).unzip();
        self.solve_bounded(model, &lower, &upper)
    }

    /// Solve the relaxation with overridden bounds (as tightened by branching).
    pub fn solve_bounded(&self, model: &Model, lower: &[f64], upper: &[f64]) -> Solution {
        if lower.iter().zip(upper).any(|(l, u)| *l > *u + self.tolerance) {
            return Solution::infeasible();
        }

        let mut tableau = self.build_tableau(model, lower, upper);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::Infeasible => return Solution::infeasible(),
                SimplexResult::Unbounded => return Solution::unbounded(),
                SimplexResult::IterationLimit => return Solution::iteration_limit(),
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Infeasible => return Solution::infeasible(),
            SimplexResult::Unbounded => return Solution::unbounded(),
            SimplexResult::IterationLimit => return Solution::iteration_limit(),
        }

        let values = self.extract_values(&tableau, model.num_variables());
        let objective_value = model.evaluate_objective(&values);
        Solution::optimal(values, objective_value)
    }

    fn build_tableau(&self, model: &Model, lower: &[f64], upper: &[f64]) -> Tableau {
        let n_vars = model.num_variables();

        let mut rows: Vec<Row> = model
            .constraints
            .iter()
            .map(|c| Row {
                coefficients: c.coefficients.clone(),
                op: c.op,
                rhs: c.rhs,
            })
            .collect();

        for j in 0..n_vars {
            if lower[j] > self.tolerance {
                rows.push(Row::unit(n_vars, j, ConstraintOp::Ge, lower[j]));
            }
            if upper[j].is_finite() {
                rows.push(Row::unit(n_vars, j, ConstraintOp::Le, upper[j]));
            }
        }

        // Keep every RHS non-negative so the slack basis starts feasible
        for row in &mut rows {
            if row.rhs < 0.0 {
                row.rhs = -row.rhs;
                row.coefficients.iter_mut().for_each(|c| *c = -*c);
                row.op = match row.op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
            }
        }

        let n_slack = rows.iter().filter(|r| r.op != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.op != ConstraintOp::Le).count();
        let n_rows = rows.len();
        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_rows + 1],
            basic_vars: vec![0; n_rows],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, row) in rows.iter().enumerate() {
            for (j, &coef) in row.coefficients.iter().enumerate().take(n_vars) {
                tableau.data[i][j] = coef;
            }
            tableau.data[i][total_cols - 1] = row.rhs;

            match row.op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // The objective row stores -c; a positive entry marks an improving column
        for (j, &coef) in model.objective.coefficients.iter().enumerate() {
            tableau.data[n_rows][j] = -coef;
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        let n_rows = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[n_rows].clone();

        // Minimize the sum of artificials
        tableau.data[n_rows].iter_mut().for_each(|x| *x = 0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_rows][j] = -1.0;
        }
        for i in 0..n_rows {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_rows][j] += tableau.data[i][j];
                }
            }
        }

        let mut iterations = 0;
        while let Some(pivot_col) = self.find_pivot_column(tableau, n_cols - 1) {
            if iterations == self.max_iterations {
                tracing::warn!(max_iterations = self.max_iterations, "simplex phase 1 iteration limit reached");
                return SimplexResult::IterationLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Infeasible;
            };
            self.pivot(tableau, pivot_row, pivot_col);
            iterations += 1;
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_rows {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return SimplexResult::Infeasible;
            }
        }

        // Drive zero-level artificials out of the basis. A row with no
        // structural entry left is redundant and stays put.
        for i in 0..n_rows {
            if tableau.basic_vars[i] >= art_start {
                if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                    self.pivot(tableau, i, col);
                }
            }
        }

        // Restore original objective and price out the basic columns
        tableau.data[n_rows] = orig_obj;
        for i in 0..n_rows {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_rows][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_rows][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns never re-enter
        let exclude_from = tableau.art_start();

        let mut iterations = 0;
        while let Some(pivot_col) = self.find_pivot_column(tableau, exclude_from) {
            if iterations == self.max_iterations {
                tracing::warn!(max_iterations = self.max_iterations, "simplex phase 2 iteration limit reached");
                return SimplexResult::IterationLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            self.pivot(tableau, pivot_row, pivot_col);
            iterations += 1;
        }
        SimplexResult::Optimal
    }

    /// Lowest-index improving column (Bland's rule)
    fn find_pivot_column(&self, tableau: &Tableau, limit: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        (0..limit).find(|&j| tableau.data[obj_row][j] > self.tolerance)
    }

    /// Minimum ratio test, ties broken by lowest basic variable index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_rows = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut best: Option<(f64, usize)> = None;

        for i in 0..n_rows {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col] / val;
            best = match best {
                None => Some((ratio, i)),
                Some((min_ratio, row)) => {
                    if ratio < min_ratio - self.tolerance
                        || (ratio <= min_ratio + self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[row])
                    {
                        Some((ratio, i))
                    } else {
                        Some((min_ratio, row))
                    }
                }
            };
        }

        best.map(|(_, row)| row)
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        tableau.data[i][j] -= factor * pivot_row[j];
                    }
                }
            }
        }
    }

    fn extract_values(&self, tableau: &Tableau, n_vars: usize) -> Vec<f64> {
        let rhs_col = tableau.data[0].len() - 1;
        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                let value = tableau.data[i][rhs_col];
                values[basic] = if value.abs() < self.tolerance { 0.0 } else { value };
            }
        }
        values
    }
}

struct Row {
    coefficients: Vec<f64>,
    op: ConstraintOp,
    rhs: f64,
}

impl Row {
    fn unit(n_vars: usize, var: usize, op: ConstraintOp, rhs: f64) -> Self {
        let mut coefficients = vec![0.0; n_vars];
        coefficients[var] = 1.0;
        Self { coefficients, op, rhs }
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Infeasible,
    Unbounded,
    /// Pivot budget spent while an improving column remained
    IterationLimit,
}
