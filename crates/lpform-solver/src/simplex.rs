use tracing::{debug, trace};

use crate::backend::{BackendError, LpBackend, RawSolution};
use crate::program::{LinearProgram, Row};

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_PIVOTS_BEFORE_BLAND: usize = 50;

/// Dense two-phase simplex solver for canonical linear programs
#[derive(Debug, Clone)]
pub struct Simplex {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for pivot selection
    tolerance: f64,
    /// Largest artificial residual accepted at the end of phase 1
    feasibility_tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
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

    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.feasibility_tolerance = tol;
        self
    }

    fn phase1(&self, tableau: &mut Tableau) -> Result<(), BackendError> {
        let obj_row = tableau.objective_row();
        let art_start = tableau.artificial_start();
        let rhs_col = tableau.rhs_col();

        // Minimize the sum of artificials, stored negated for the maximizing pivot rule
        tableau.data[obj_row].fill(0.0);
        for j in art_start..rhs_col {
            tableau.data[obj_row][j] = -1.0;
        }
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..=rhs_col {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, rhs_col) {
            Ok(()) => {}
            Err(BackendError::Unbounded) => {
                return Err(BackendError::Numerical(
                    "phase 1 objective became unbounded".to_string(),
                ));
            }
            Err(e) => return Err(e),
        }

        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col] > self.feasibility_tolerance {
                debug!(
                    residual = tableau.data[i][rhs_col],
                    "phase 1 ended with a positive artificial"
                );
                return Err(BackendError::Infeasible);
            }
        }

        self.drive_out_artificials(tableau);
        Ok(())
    }

    /// Pivot zero-level artificials out of the basis. A row whose structural
    /// and slack entries are all zero is redundant and keeps its artificial.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.artificial_start();
        let rhs_col = tableau.rhs_col();

        for i in 0..tableau.objective_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let entering = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            match entering {
                Some(j) => {
                    tableau.data[i][rhs_col] = 0.0;
                    tableau.pivot(i, j);
                }
                None => trace!(row = i, "redundant row"),
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau) -> Result<(), BackendError> {
        let obj_row = tableau.objective_row();
        let rhs_col = tableau.rhs_col();

        tableau.data[obj_row].fill(0.0);
        for (j, &cost) in tableau.costs.iter().enumerate() {
            tableau.data[obj_row][j] = -cost;
        }
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let factor = tableau.data[obj_row][basic];
            if factor != 0.0 {
                for j in 0..=rhs_col {
                    tableau.data[obj_row][j] -= factor * tableau.data[i][j];
                }
            }
        }

        // Artificial columns never re-enter
        let limit = tableau.artificial_start();
        self.iterate(tableau, limit)
    }

    /// Pivot until no column below `col_limit` can improve the objective
    fn iterate(&self, tableau: &mut Tableau, col_limit: usize) -> Result<(), BackendError> {
        let rhs_col = tableau.rhs_col();
        let mut degenerate = 0;

        for iteration in 0..self.max_iterations {
            let bland = degenerate >= DEGENERATE_PIVOTS_BEFORE_BLAND;
            let Some(col) = self.find_pivot_column(tableau, col_limit, bland) else {
                debug!(iterations = iteration, "simplex phase converged");
                return Ok(());
            };
            let Some(row) = self.find_pivot_row(tableau, col) else {
                return Err(BackendError::Unbounded);
            };

            if tableau.data[row][rhs_col].abs() <= self.tolerance {
                degenerate += 1;
            } else {
                degenerate = 0;
            }
            trace!(row, col, bland, "pivot");
            tableau.pivot(row, col);
        }

        Err(BackendError::IterationLimit(self.max_iterations))
    }

    fn find_pivot_column(&self, tableau: &Tableau, col_limit: usize, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.objective_row()][..col_limit];

        if bland {
            return obj.iter().position(|&v| v > self.tolerance);
        }

        // Most positive entry improves the objective fastest
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &v) in obj.iter().enumerate() {
            if v > max_val {
                max_val = v;
                max_col = Some(j);
            }
        }
        max_col
    }

    /// Minimum ratio test, ties broken by the lowest basic variable index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.objective_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            let better = match min_row {
                None => true,
                Some(r) => {
                    ratio < min_ratio - self.tolerance
                        || (ratio <= min_ratio + self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[r])
                }
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }
}

impl LpBackend for Simplex {
    fn name(&self) -> &'static str {
        "simplex"
    }

    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, BackendError> {
        program.validate()?;

        let mut tableau = Tableau::build(program);
        debug!(
            rows = tableau.objective_row(),
            structural = tableau.n_structural,
            slack = tableau.n_slack,
            artificial = tableau.n_artificial,
            "built simplex tableau"
        );

        if tableau.n_artificial > 0 {
            self.phase1(&mut tableau)?;
        }
        self.phase2(&mut tableau)?;

        Ok(tableau.extract(program, self.feasibility_tolerance))
    }
}

/// How one program variable is expressed in tableau columns:
/// `x = offset + sum(sign * y[col])` with every `y >= 0`.
#[derive(Debug, Clone)]
struct Substitution {
    offset: f64,
    terms: Vec<(usize, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Le,
    Ge,
    Eq,
}

struct StandardRow {
    coefficients: Vec<f64>,
    rhs: f64,
    kind: RowKind,
}

struct Tableau {
    /// Constraint rows followed by the objective row; the last column is the rhs
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_structural: usize,
    n_slack: usize,
    n_artificial: usize,
    /// Phase 2 costs over structural columns
    costs: Vec<f64>,
    substitutions: Vec<Substitution>,
}

impl Tableau {
    fn build(program: &LinearProgram) -> Self {
        let mut substitutions = Vec::with_capacity(program.num_variables());
        let mut bound_rows = Vec::new();
        let mut n_structural = 0;

        for b in &program.bounds {
            let sub = if b.lower.is_finite() {
                let col = n_structural;
                n_structural += 1;
                if b.upper.is_finite() {
                    bound_rows.push((col, b.upper - b.lower));
                }
                Substitution {
                    offset: b.lower,
                    terms: vec![(col, 1.0)],
                }
            } else if b.upper.is_finite() {
                let col = n_structural;
                n_structural += 1;
                Substitution {
                    offset: b.upper,
                    terms: vec![(col, -1.0)],
                }
            } else {
                let col = n_structural;
                n_structural += 2;
                Substitution {
                    offset: 0.0,
                    terms: vec![(col, 1.0), (col + 1, -1.0)],
                }
            };
            substitutions.push(sub);
        }

        let mut rows: Vec<StandardRow> = Vec::with_capacity(program.num_rows() + bound_rows.len());
        for row in &program.inequalities {
            rows.push(substitute(row, &substitutions, n_structural, RowKind::Le));
        }
        for row in &program.equalities {
            rows.push(substitute(row, &substitutions, n_structural, RowKind::Eq));
        }
        for (col, cap) in bound_rows {
            let mut coefficients = vec![0.0; n_structural];
            coefficients[col] = 1.0;
            rows.push(StandardRow {
                coefficients,
                rhs: cap,
                kind: RowKind::Le,
            });
        }

        // Keep every rhs non-negative
        for row in &mut rows {
            if row.rhs < 0.0 {
                row.rhs = -row.rhs;
                row.coefficients.iter_mut().for_each(|a| *a = -*a);
                row.kind = match row.kind {
                    RowKind::Le => RowKind::Ge,
                    RowKind::Ge => RowKind::Le,
                    RowKind::Eq => RowKind::Eq,
                };
            }
        }

        let n_slack = rows.iter().filter(|r| r.kind != RowKind::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.kind != RowKind::Le).count();
        let total_cols = n_structural + n_slack + n_artificial + 1;
        let n_rows = rows.len();

        let mut data = vec![vec![0.0; total_cols]; n_rows + 1];
        let mut basic_vars = vec![0; n_rows];
        let mut slack_idx = n_structural;
        let mut artificial_idx = n_structural + n_slack;

        for (i, row) in rows.iter().enumerate() {
            data[i][..n_structural].copy_from_slice(&row.coefficients);
            data[i][total_cols - 1] = row.rhs;

            match row.kind {
                RowKind::Le => {
                    data[i][slack_idx] = 1.0;
                    basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                RowKind::Ge => {
                    data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                RowKind::Eq => {
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        let mut costs = vec![0.0; n_structural];
        for (sub, &c) in substitutions.iter().zip(&program.objective) {
            for &(col, sign) in &sub.terms {
                costs[col] += c * sign;
            }
        }

        Tableau {
            data,
            basic_vars,
            n_structural,
            n_slack,
            n_artificial,
            costs,
            substitutions,
        }
    }

    fn objective_row(&self) -> usize {
        self.data.len() - 1
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    fn artificial_start(&self) -> usize {
        self.n_structural + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        self.data[row].iter_mut().for_each(|v| *v /= pivot_val);

        let pivot_row = self.data[row].clone();
        for (i, target) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = target[col];
            if factor != 0.0 {
                for (v, p) in target.iter_mut().zip(&pivot_row) {
                    *v -= factor * p;
                }
            }
        }
    }

    fn extract(&self, program: &LinearProgram, snap: f64) -> RawSolution {
        let rhs_col = self.rhs_col();

        let mut y = vec![0.0; self.n_structural];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_structural {
                y[basic] = self.data[i][rhs_col];
            }
        }

        let values: Vec<f64> = self
            .substitutions
            .iter()
            .map(|sub| {
                let v = sub.offset + sub.terms.iter().map(|&(col, sign)| sign * y[col]).sum::<f64>();
                if v.abs() < snap { 0.0 } else { v }
            })
            .collect();
        let objective_value = program.objective_value(&values);

        RawSolution {
            values,
            objective_value,
        }
    }
}

fn substitute(row: &Row, substitutions: &[Substitution], n_structural: usize, kind: RowKind) -> StandardRow {
    let mut coefficients = vec![0.0; n_structural];
    let mut rhs = row.rhs;
    for (sub, &a) in substitutions.iter().zip(&row.coefficients) {
        rhs -= a * sub.offset;
        for &(col, sign) in &sub.terms {
            coefficients[col] += a * sign;
        }
    }
    StandardRow {
        coefficients,
        rhs,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Bound;

    fn assert_close(actual: f64, expected: f64, what: &str) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "{} = {} (expected {})",
            what,
            actual,
            expected
        );
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y, as minimize -3x - 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=-11
        let mut lp = LinearProgram::new(vec![-3.0, -2.0]);
        lp.add_inequality(vec![1.0, 1.0], 4.0);
        lp.add_inequality(vec![1.0, 0.0], 3.0);
        lp.add_inequality(vec![0.0, 1.0], 3.0);

        let solution = Simplex::new().solve(&lp).unwrap();

        assert_close(solution.values[0], 3.0, "x");
        assert_close(solution.values[1], 1.0, "y");
        assert_close(solution.objective_value, -11.0, "obj");
    }

    #[test]
    fn test_minimization_with_negated_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4, stored as -x - y <= -4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut lp = LinearProgram::new(vec![2.0, 3.0]);
        lp.add_inequality(vec![-1.0, -1.0], -4.0);
        lp.add_inequality(vec![1.0, 0.0], 3.0);
        lp.add_inequality(vec![0.0, 1.0], 3.0);

        let solution = Simplex::new().solve(&lp).unwrap();

        assert_close(solution.values[0], 3.0, "x");
        assert_close(solution.values[1], 1.0, "y");
        assert_close(solution.objective_value, 9.0, "obj");
    }

    #[test]
    fn test_equality_rows() {
        // Minimize x + 2y subject to x + y = 5, x <= 3
        let mut lp = LinearProgram::new(vec![1.0, 2.0]);
        lp.add_equality(vec![1.0, 1.0], 5.0);
        lp.add_inequality(vec![1.0, 0.0], 3.0);

        let solution = Simplex::new().solve(&lp).unwrap();

        assert_close(solution.values[0], 3.0, "x");
        assert_close(solution.values[1], 2.0, "y");
        assert_close(solution.objective_value, 7.0, "obj");
    }

    #[test]
    fn test_infeasible() {
        // x >= 5, x <= 3
        let mut lp = LinearProgram::new(vec![1.0]);
        lp.add_inequality(vec![-1.0], -5.0);
        lp.add_inequality(vec![1.0], 3.0);

        assert_eq!(Simplex::new().solve(&lp), Err(BackendError::Infeasible));
    }

    #[test]
    fn test_feasibility_tolerance() {
        // x <= 1, x >= 1 + 1e-6
        let mut lp = LinearProgram::new(vec![1.0]);
        lp.add_inequality(vec![1.0], 1.0);
        lp.add_inequality(vec![-1.0], -1.000001);

        assert_eq!(Simplex::new().solve(&lp), Err(BackendError::Infeasible));

        let solution = Simplex::new().with_feasibility_tolerance(1e-4).solve(&lp).unwrap();
        assert!((solution.values[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unbounded() {
        // Minimize -x - y subject to x - y <= 1
        let mut lp = LinearProgram::new(vec![-1.0, -1.0]);
        lp.add_inequality(vec![1.0, -1.0], 1.0);

        assert_eq!(Simplex::new().solve(&lp), Err(BackendError::Unbounded));
    }

    #[test]
    fn test_shifted_lower_bounds() {
        // Minimize x + y with x >= 2, y >= -3 and x + y >= 1
        let mut lp = LinearProgram::new(vec![1.0, 1.0]).with_bounds(vec![Bound::at_least(2.0), Bound::at_least(-3.0)]);
        lp.add_inequality(vec![-1.0, -1.0], -1.0);

        let solution = Simplex::new().solve(&lp).unwrap();

        assert_close(solution.values[0] + solution.values[1], 1.0, "x + y");
        assert!(solution.values[0] >= 2.0 - 1e-9);
        assert!(solution.values[1] >= -3.0 - 1e-9);
        assert_close(solution.objective_value, 1.0, "obj");
    }

    #[test]
    fn test_upper_and_free_bounds() {
        // Maximize x + y (minimize -x - y) with x in [1, 4], y <= 2 and y free below
        let lp = LinearProgram::new(vec![-1.0, -1.0])
            .with_bounds(vec![Bound::new(1.0, 4.0), Bound::new(f64::NEG_INFINITY, 2.0)]);

        let solution = Simplex::new().solve(&lp).unwrap();

        assert_close(solution.values[0], 4.0, "x");
        assert_close(solution.values[1], 2.0, "y");
        assert_close(solution.objective_value, -6.0, "obj");
    }

    #[test]
    fn test_free_variable() {
        // Minimize x with x free and x >= -7 expressed as a row
        let mut lp = LinearProgram::new(vec![1.0]).with_bounds(vec![Bound::free()]);
        lp.add_inequality(vec![-1.0], 7.0);

        let solution = Simplex::new().solve(&lp).unwrap();
        assert_close(solution.values[0], -7.0, "x");
    }

    #[test]
    fn test_crossed_bounds_are_infeasible() {
        let lp = LinearProgram::new(vec![1.0]).with_bounds(vec![Bound::new(5.0, 1.0)]);
        assert_eq!(Simplex::new().solve(&lp), Err(BackendError::Infeasible));
    }

    #[test]
    fn test_redundant_equalities() {
        // Balanced 2x2 transportation: one of the four equalities is implied
        // by the others, so an artificial stays in the basis on that row.
        let mut lp = LinearProgram::new(vec![4.0, 6.0, 5.0, 3.0]);
        lp.add_equality(vec![1.0, 1.0, 0.0, 0.0], 10.0);
        lp.add_equality(vec![0.0, 0.0, 1.0, 1.0], 15.0);
        lp.add_equality(vec![1.0, 0.0, 1.0, 0.0], 12.0);
        lp.add_equality(vec![0.0, 1.0, 0.0, 1.0], 13.0);

        let solution = Simplex::new().solve(&lp).unwrap();

        // x00=10, x01=0, x10=2, x11=13 -> 40 + 10 + 39
        assert_close(solution.values[0], 10.0, "x00");
        assert_close(solution.values[1], 0.0, "x01");
        assert_close(solution.values[2], 2.0, "x10");
        assert_close(solution.values[3], 13.0, "x11");
        assert_close(solution.objective_value, 89.0, "obj");
    }

    #[test]
    fn test_iteration_limit_is_an_error() {
        let mut lp = LinearProgram::new(vec![-3.0, -5.0]);
        lp.add_inequality(vec![1.0, 0.0], 4.0);
        lp.add_inequality(vec![0.0, 2.0], 12.0);
        lp.add_inequality(vec![3.0, 2.0], 18.0);

        let result = Simplex::new().with_max_iterations(1).solve(&lp);
        assert_eq!(result, Err(BackendError::IterationLimit(1)));
    }

    #[test]
    fn test_invalid_program_rejected() {
        let mut lp = LinearProgram::new(vec![1.0, 1.0]);
        lp.add_inequality(vec![1.0], 1.0);

        assert!(matches!(
            Simplex::new().solve(&lp),
            Err(BackendError::InvalidProgram(_))
        ));
    }
}
