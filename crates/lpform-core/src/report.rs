use lpform_solver::LinearProgram;

use crate::model::{GeneralProblem, Relation, TransportProblem};
use crate::outcome::SolveOutcome;
use crate::transport::Balance;

/// Tolerance used when auditing a solution against its constraints
const AUDIT_TOLERANCE: f64 = 1e-6;

/// Everything a reporting layer needs to reproduce a general solve by hand:
/// the inputs as given, the canonical form sent to the backend, and the outcome.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralReport {
    pub problem: GeneralProblem,
    pub canonical: LinearProgram,
    pub outcome: SolveOutcome,
}

/// Transport counterpart of [`GeneralReport`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportReport {
    pub problem: TransportProblem,
    pub canonical: LinearProgram,
    pub balance: Balance,
    pub outcome: SolveOutcome,
    /// `shipments[i][j]` from origin `i` to destination `j`, when optimal
    pub shipments: Option<Vec<Vec<f64>>>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    General(GeneralReport),
    Transport(TransportReport),
}

/// One original constraint evaluated at the solution
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintCheck {
    /// Position in the original constraint list
    pub index: usize,
    pub lhs: f64,
    pub relation: Relation,
    pub rhs: f64,
    /// Distance from violation; negative when violated
    pub slack: f64,
    pub satisfied: bool,
    pub binding: bool,
}

/// Quantity moved against its target for one origin or destination
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FlowCheck {
    pub index: usize,
    pub total: f64,
    pub target: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportAudit {
    pub origins: Vec<FlowCheck>,
    pub destinations: Vec<FlowCheck>,
}

impl GeneralReport {
    /// Evaluate every original constraint at the optimal point.
    /// Empty unless the outcome is optimal.
    pub fn audit(&self) -> Vec<ConstraintCheck> {
        let Some(solution) = self.outcome.solution() else {
            return Vec::new();
        };

        self.problem
            .constraints
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let lhs: f64 = c.coefficients.iter().zip(&solution.values).map(|(a, x)| a * x).sum();
                let mut slack = match c.relation {
                    Relation::Le => c.rhs - lhs,
                    Relation::Ge => lhs - c.rhs,
                    Relation::Eq => -(lhs - c.rhs).abs(),
                };
                // Report a met limit as exactly zero, never -0 or rounding noise
                if slack.abs() <= AUDIT_TOLERANCE {
                    slack = 0.0;
                }
                ConstraintCheck {
                    index,
                    lhs,
                    relation: c.relation,
                    rhs: c.rhs,
                    slack,
                    satisfied: slack >= -AUDIT_TOLERANCE,
                    binding: slack.abs() <= AUDIT_TOLERANCE,
                }
            })
            .collect()
    }
}

impl TransportReport {
    /// Shipped total per origin and received total per destination
    pub fn audit(&self) -> Option<TransportAudit> {
        let shipments = self.shipments.as_ref()?;

        let origins = shipments
            .iter()
            .zip(&self.problem.supply)
            .enumerate()
            .map(|(index, (row, &target))| FlowCheck {
                index,
                total: row.iter().sum(),
                target,
            })
            .collect();
        let destinations = self
            .problem
            .demand
            .iter()
            .enumerate()
            .map(|(index, &target)| FlowCheck {
                index,
                total: shipments.iter().map(|row| row[index]).sum(),
                target,
            })
            .collect();

        Some(TransportAudit { origins, destinations })
    }
}

impl Report {
    pub fn outcome(&self) -> &SolveOutcome {
        match self {
            Report::General(r) => &r.outcome,
            Report::Transport(r) => &r.outcome,
        }
    }

    pub fn canonical(&self) -> &LinearProgram {
        match self {
            Report::General(r) => &r.canonical,
            Report::Transport(r) => &r.canonical,
        }
    }
}
