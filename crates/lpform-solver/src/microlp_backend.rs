use microlp::{ComparisonOp, OptimizationDirection, Problem};
use tracing::debug;

use crate::backend::{BackendError, LpBackend, RawSolution};
use crate::program::{LinearProgram, Row};

/// Backend delegating to the `microlp` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Microlp;

impl Microlp {
    pub fn new() -> Self {
        Self
    }
}

impl LpBackend for Microlp {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, BackendError> {
        program.validate()?;

        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let vars: Vec<_> = program
            .objective
            .iter()
            .zip(&program.bounds)
            .map(|(&c, b)| problem.add_var(c, (b.lower, b.upper)))
            .collect();

        let rows = program
            .inequalities
            .iter()
            .map(|r| (r, ComparisonOp::Le))
            .chain(program.equalities.iter().map(|r| (r, ComparisonOp::Eq)));
        for (row, op) in rows {
            if row.coefficients.iter().all(|&a| a == 0.0) {
                check_empty_row(row, op)?;
                continue;
            }
            let expr: Vec<_> = vars
                .iter()
                .zip(&row.coefficients)
                .filter(|&(_, &a)| a != 0.0)
                .map(|(&v, &a)| (v, a))
                .collect();
            problem.add_constraint(expr, op, row.rhs);
        }

        let solution = problem.solve().map_err(|e| match e {
            microlp::Error::Infeasible => BackendError::Infeasible,
            microlp::Error::Unbounded => BackendError::Unbounded,
            other => BackendError::Internal(other.to_string()),
        })?;

        let values: Vec<f64> = vars.iter().map(|&v| solution[v]).collect();
        debug!(objective = solution.objective(), "microlp solved");

        Ok(RawSolution {
            objective_value: program.objective_value(&values),
            values,
        })
    }
}

/// `0 <= rhs` or `0 = rhs`, decided without the library
fn check_empty_row(row: &Row, op: ComparisonOp) -> Result<(), BackendError> {
    let holds = match op {
        ComparisonOp::Eq => row.rhs == 0.0,
        _ => row.rhs >= 0.0,
    };
    if holds { Ok(()) } else { Err(BackendError::Infeasible) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplex::Simplex;

    #[test]
    fn test_matches_simplex() {
        let mut lp = LinearProgram::new(vec![-3.0, -5.0]);
        lp.add_inequality(vec![1.0, 0.0], 4.0);
        lp.add_inequality(vec![0.0, 2.0], 12.0);
        lp.add_inequality(vec![3.0, 2.0], 18.0);

        let a = Microlp::new().solve(&lp).unwrap();
        let b = Simplex::new().solve(&lp).unwrap();

        assert!((a.objective_value - b.objective_value).abs() < 1e-6);
        assert!((a.values[0] - 2.0).abs() < 1e-6);
        assert!((a.values[1] - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        let mut lp = LinearProgram::new(vec![1.0, 0.0]);
        lp.add_inequality(vec![1.0, 0.0], 1.0);
        lp.add_inequality(vec![-1.0, 0.0], -5.0);

        assert_eq!(Microlp::new().solve(&lp), Err(BackendError::Infeasible));
    }

    #[test]
    fn test_empty_row() {
        let mut lp = LinearProgram::new(vec![1.0, 1.0]);
        lp.add_equality(vec![0.0, 0.0], 3.0);

        assert_eq!(Microlp::new().solve(&lp), Err(BackendError::Infeasible));
    }
}
