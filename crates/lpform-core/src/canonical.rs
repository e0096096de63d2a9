use lpform_solver::{Bound, LinearProgram};
use thiserror::Error;
use tracing::debug;

use crate::model::{RawConstraint, Relation, Sense, TransportProblem};
use crate::transport::{flat_index, flatten};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{context}: expected {expected} entries, found {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },
    #[error("problem has no decision variables")]
    EmptyObjective,
    #[error("non-finite value in {context}")]
    NonFinite { context: String },
    #[error("total supply {supply} does not match total demand {demand}")]
    Unbalanced { supply: f64, demand: f64 },
}

/// A canonical program together with the sense the user asked for.
///
/// The objective inside `program` is always a minimization; `sense` is what
/// the orchestrator uses to report the objective value the right way round.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalProgram {
    pub program: LinearProgram,
    pub sense: Sense,
}

/// Translate an objective and mixed-sign constraints into canonical form.
///
/// `>=` rows are negated into `<=` rows, `=` rows are kept as equalities, and
/// every variable gets the bound `[lower_bound, +inf)`.
pub fn canonicalize_general(
    sense: Sense,
    objective: &[f64],
    constraints: &[RawConstraint],
    lower_bound: f64,
) -> Result<CanonicalProgram, ModelError> {
    let n = objective.len();
    if n == 0 {
        return Err(ModelError::EmptyObjective);
    }
    ensure_finite(objective, "objective")?;
    if lower_bound.is_nan() || lower_bound == f64::INFINITY {
        return Err(ModelError::NonFinite {
            context: "lower bound".to_string(),
        });
    }

    for (i, c) in constraints.iter().enumerate() {
        if c.coefficients.len() != n {
            return Err(ModelError::DimensionMismatch {
                context: format!("constraint {}", i + 1),
                expected: n,
                found: c.coefficients.len(),
            });
        }
        ensure_finite(&c.coefficients, &format!("constraint {}", i + 1))?;
        ensure_finite(&[c.rhs], &format!("right-hand side of constraint {}", i + 1))?;
    }

    let mut program = LinearProgram::new(sense.to_minimization(objective)).with_bounds(vec![Bound::at_least(lower_bound); n]);
    for c in constraints {
        match c.relation {
            Relation::Le => program.add_inequality(c.coefficients.clone(), c.rhs),
            Relation::Ge => program.add_inequality(c.coefficients.iter().map(|a| -a).collect(), -c.rhs),
            Relation::Eq => program.add_equality(c.coefficients.clone(), c.rhs),
        }
    }

    debug!(
        %sense,
        variables = n,
        inequalities = program.inequalities.len(),
        equalities = program.equalities.len(),
        "canonicalized general problem"
    );
    Ok(CanonicalProgram { program, sense })
}

/// Build the equality-constrained minimum-cost program for a transport problem.
///
/// One supply row per origin and one demand row per destination. Supply and
/// demand totals are not compared here.
pub fn canonicalize_transport(problem: &TransportProblem) -> Result<CanonicalProgram, ModelError> {
    let origins = problem.costs.len();
    let destinations = problem.costs.first().map_or(0, Vec::len);
    if origins == 0 || destinations == 0 {
        return Err(ModelError::EmptyObjective);
    }

    for (i, row) in problem.costs.iter().enumerate() {
        if row.len() != destinations {
            return Err(ModelError::DimensionMismatch {
                context: format!("cost row for origin {}", i + 1),
                expected: destinations,
                found: row.len(),
            });
        }
        ensure_finite(row, &format!("cost row for origin {}", i + 1))?;
    }
    if problem.supply.len() != origins {
        return Err(ModelError::DimensionMismatch {
            context: "supply".to_string(),
            expected: origins,
            found: problem.supply.len(),
        });
    }
    if problem.demand.len() != destinations {
        return Err(ModelError::DimensionMismatch {
            context: "demand".to_string(),
            expected: destinations,
            found: problem.demand.len(),
        });
    }
    ensure_finite(&problem.supply, "supply")?;
    ensure_finite(&problem.demand, "demand")?;

    let n = origins * destinations;
    let mut program = LinearProgram::new(flatten(&problem.costs));
    for (i, &supply) in problem.supply.iter().enumerate() {
        let mut row = vec![0.0; n];
        for j in 0..destinations {
            row[flat_index(i, j, destinations)] = 1.0;
        }
        program.add_equality(row, supply);
    }
    for (j, &demand) in problem.demand.iter().enumerate() {
        let mut row = vec![0.0; n];
        for i in 0..origins {
            row[flat_index(i, j, destinations)] = 1.0;
        }
        program.add_equality(row, demand);
    }

    debug!(origins, destinations, "canonicalized transport problem");
    Ok(CanonicalProgram {
        program,
        sense: Sense::Minimize,
    })
}

fn ensure_finite(values: &[f64], context: &str) -> Result<(), ModelError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFinite {
            context: context.to_string(),
        })
    }
}
