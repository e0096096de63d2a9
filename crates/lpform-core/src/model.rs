use std::fmt;

/// Direction of the user's objective
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    Maximize,
    #[default]
    Minimize,
}

impl Sense {
    /// Coefficients of the equivalent minimization objective
    pub fn to_minimization(self, coefficients: &[f64]) -> Vec<f64> {
        match self {
            Sense::Maximize => coefficients.iter().map(|c| -c).collect(),
            Sense::Minimize => coefficients.to_vec(),
        }
    }

    /// Map a minimization objective value back to this sense
    pub fn restore_objective(self, value: f64) -> f64 {
        match self {
            Sense::Maximize => -value,
            Sense::Minimize => value,
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Maximize => write!(f, "maximize"),
            Sense::Minimize => write!(f, "minimize"),
        }
    }
}

/// Relational sign of a constraint row
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Le => f.pad("<="),
            Relation::Ge => f.pad(">="),
            Relation::Eq => f.pad("="),
        }
    }
}

/// A constraint as the user wrote it, before canonicalization
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RawConstraint {
    pub coefficients: Vec<f64>,
    pub relation: Relation,
    pub rhs: f64,
}

impl RawConstraint {
    pub fn new(coefficients: Vec<f64>, relation: Relation, rhs: f64) -> Self {
        Self {
            coefficients,
            relation,
            rhs,
        }
    }

    pub fn le(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self::new(coefficients, Relation::Le, rhs)
    }

    pub fn ge(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self::new(coefficients, Relation::Ge, rhs)
    }

    pub fn eq(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self::new(coefficients, Relation::Eq, rhs)
    }
}

/// Objective plus mixed-sign constraints over `objective.len()` variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralProblem {
    pub sense: Sense,
    pub objective: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub constraints: Vec<RawConstraint>,
    /// Floor applied to every variable; `"-inf"` in JSON leaves them free
    #[cfg_attr(feature = "serde", serde(default, with = "lpform_solver::serde_float"))]
    pub lower_bound: f64,
}

impl GeneralProblem {
    pub fn new(sense: Sense, objective: Vec<f64>) -> Self {
        Self {
            sense,
            objective,
            constraints: Vec::new(),
            lower_bound: 0.0,
        }
    }

    pub fn with_lower_bound(mut self, lower_bound: f64) -> Self {
        self.lower_bound = lower_bound;
        self
    }

    pub fn constraint(mut self, constraint: RawConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }
}

/// Balanced shipping problem: `costs[i][j]` per unit from origin `i` to destination `j`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportProblem {
    pub costs: Vec<Vec<f64>>,
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
}

impl TransportProblem {
    pub fn new(costs: Vec<Vec<f64>>, supply: Vec<f64>, demand: Vec<f64>) -> Self {
        Self { costs, supply, demand }
    }

    pub fn origins(&self) -> usize {
        self.supply.len()
    }

    pub fn destinations(&self) -> usize {
        self.demand.len()
    }
}

/// Any problem the core can solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    General(GeneralProblem),
    Transport(TransportProblem),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sense_negation_points() {
        let c = [3.0, -5.0, 0.0];
        assert_eq!(Sense::Maximize.to_minimization(&c), vec![-3.0, 5.0, -0.0]);
        assert_eq!(Sense::Minimize.to_minimization(&c), c.to_vec());

        assert_eq!(Sense::Maximize.restore_objective(-36.0), 36.0);
        assert_eq!(Sense::Minimize.restore_objective(10.0), 10.0);
    }

    #[test]
    fn test_relation_display() {
        assert_eq!(Relation::Le.to_string(), "<=");
        assert_eq!(Relation::Ge.to_string(), ">=");
        assert_eq!(Relation::Eq.to_string(), "=");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_problem_from_json() {
        let source = r#"{
            "kind": "general",
            "sense": "maximize",
            "objective": [3, 5],
            "constraints": [
                { "coefficients": [1, 0], "relation": "<=", "rhs": 4 },
                { "coefficients": [1, 1], "relation": ">=", "rhs": 1 }
            ]
        }"#;

        let problem: Problem = serde_json::from_str(source).unwrap();
        let Problem::General(general) = problem else {
            panic!("expected a general problem");
        };
        assert_eq!(general.sense, Sense::Maximize);
        assert_eq!(general.lower_bound, 0.0);
        assert_eq!(general.constraints[1].relation, Relation::Ge);

        let source = r#"{ "kind": "transport", "costs": [[1, 2]], "supply": [5], "demand": [2, 3] }"#;
        let problem: Problem = serde_json::from_str(source).unwrap();
        assert!(matches!(problem, Problem::Transport(t) if t.destinations() == 2));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_free_lower_bound_from_json() {
        let source = r#"{ "kind": "general", "sense": "minimize", "objective": [1], "lower_bound": "-inf" }"#;
        let problem: Problem = serde_json::from_str(source).unwrap();
        let Problem::General(general) = problem else {
            panic!("expected a general problem");
        };
        assert_eq!(general.lower_bound, f64::NEG_INFINITY);

        let json = serde_json::to_value(&general).unwrap();
        assert_eq!(json["lower_bound"], "-inf");
    }
}
