use thiserror::Error;

use crate::program::{LinearProgram, ProgramError};

/// A numeric engine able to solve a canonical [`LinearProgram`].
///
/// Implementations take the program as given: a minimization objective,
/// `<=` rows, `=` rows and per-variable bounds. Recovering the user's
/// objective sense is the caller's job.
pub trait LpBackend {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Solve `program` to optimality or report why that was impossible
    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, BackendError>;
}

/// Optimal point as returned by a backend, in canonical terms
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    /// Value of each variable, in program order
    pub values: Vec<f64>,
    /// Value of the minimization objective at `values`
    pub objective_value: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("no point satisfies all constraints and bounds")]
    Infeasible,
    #[error("objective can be improved without limit")]
    Unbounded,
    #[error("iteration limit of {0} reached before optimality")]
    IterationLimit(usize),
    #[error("numerical failure: {0}")]
    Numerical(String),
    #[error("invalid program: {0}")]
    InvalidProgram(#[from] ProgramError),
    #[error("backend failure: {0}")]
    Internal(String),
}

impl<B: LpBackend + ?Sized> LpBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, program: &LinearProgram) -> Result<RawSolution, BackendError> {
        (**self).solve(program)
    }
}
