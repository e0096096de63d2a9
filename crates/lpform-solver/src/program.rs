use thiserror::Error;

/// A linear program in canonical form:
///
/// ```text
/// minimize    objective · x
/// subject to  row · x <= rhs   for every row in `inequalities`
///             row · x  = rhs   for every row in `equalities`
///             lower <= x <= upper
/// ```
///
/// `objective`, every row and `bounds` share one variable ordering, fixed when
/// the program is built.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    /// Minimization coefficients, one per variable
    pub objective: Vec<f64>,
    /// Rows asserting `row · x <= rhs`
    pub inequalities: Vec<Row>,
    /// Rows asserting `row · x = rhs`
    pub equalities: Vec<Row>,
    /// Per-variable bound interval
    pub bounds: Vec<Bound>,
}

/// One constraint row with its right-hand side
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub coefficients: Vec<f64>,
    pub rhs: f64,
}

/// Bound interval for a single variable. Infinite sides are unbounded.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_float"))]
    pub lower: f64,
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_float"))]
    pub upper: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgramError {
    #[error("{kind} row {row} has {found} coefficients, expected {expected}")]
    RowLength {
        kind: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("program has {found} bounds for {expected} variables")]
    BoundsLength { expected: usize, found: usize },
    #[error("non-finite value in {0}")]
    NonFinite(String),
    #[error("invalid bound for variable {index}: [{lower}, {upper}]")]
    InvalidBound { index: usize, lower: f64, upper: f64 },
}

impl Row {
    pub fn new(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self { coefficients, rhs }
    }
}

impl Bound {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `[lower, +inf)`
    pub fn at_least(lower: f64) -> Self {
        Self::new(lower, f64::INFINITY)
    }

    pub fn non_negative() -> Self {
        Self::at_least(0.0)
    }

    pub fn free() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }
}

impl LinearProgram {
    /// A program over `objective.len()` non-negative variables with no rows
    pub fn new(objective: Vec<f64>) -> Self {
        let n = objective.len();
        Self {
            objective,
            inequalities: Vec::new(),
            equalities: Vec::new(),
            bounds: vec![Bound::non_negative(); n],
        }
    }

    pub fn with_bounds(mut self, bounds: Vec<Bound>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn add_inequality(&mut self, coefficients: Vec<f64>, rhs: f64) {
        self.inequalities.push(Row::new(coefficients, rhs));
    }

    pub fn add_equality(&mut self, coefficients: Vec<f64>, rhs: f64) {
        self.equalities.push(Row::new(coefficients, rhs));
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_rows(&self) -> usize {
        self.inequalities.len() + self.equalities.len()
    }

    /// Evaluate the (minimization) objective at `values`
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, x)| c * x).sum()
    }

    /// Check that every row and the bounds line up with the objective and
    /// that all data is usable by a numeric backend.
    pub fn validate(&self) -> Result<(), ProgramError> {
        let n = self.num_variables();

        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(ProgramError::NonFinite("objective".to_string()));
        }

        let rows = self
            .inequalities
            .iter()
            .map(|r| ("inequality", r))
            .enumerate()
            .chain(self.equalities.iter().map(|r| ("equality", r)).enumerate());
        for (i, (kind, row)) in rows {
            if row.coefficients.len() != n {
                return Err(ProgramError::RowLength {
                    kind,
                    row: i,
                    expected: n,
                    found: row.coefficients.len(),
                });
            }
            if !row.rhs.is_finite() || row.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(ProgramError::NonFinite(format!("{} row {}", kind, i)));
            }
        }

        if self.bounds.len() != n {
            return Err(ProgramError::BoundsLength {
                expected: n,
                found: self.bounds.len(),
            });
        }
        for (index, b) in self.bounds.iter().enumerate() {
            if b.lower.is_nan() || b.upper.is_nan() || b.lower == f64::INFINITY || b.upper == f64::NEG_INFINITY {
                return Err(ProgramError::InvalidBound {
                    index,
                    lower: b.lower,
                    upper: b.upper,
                });
            }
        }

        Ok(())
    }
}
