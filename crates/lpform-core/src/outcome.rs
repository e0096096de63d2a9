/// Result of one solve, in the user's terms
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// An optimal solution was found
    Optimal(Solution),
    /// No point satisfies all constraints and bounds
    Infeasible,
    /// The objective can be improved without limit
    Unbounded,
    /// The backend failed for any other reason
    SolverError { message: String },
}

/// Optimal point with variables labeled in program order
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Objective value in the original sense
    pub objective_value: f64,
}

impl SolveOutcome {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveOutcome::Optimal(_))
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Optimal(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            SolveOutcome::Optimal(_) => "OPTIMAL",
            SolveOutcome::Infeasible => "INFEASIBLE",
            SolveOutcome::Unbounded => "UNBOUNDED",
            SolveOutcome::SolverError { .. } => "ERROR",
        }
    }
}

impl Solution {
    /// `(label, value)` pairs in program order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.iter().find(|(l, _)| *l == label).map(|(_, v)| v)
    }
}

/// `x1`, `x2`, ... for general problems
pub fn variable_label(index: usize) -> String {
    format!("x{}", index + 1)
}

/// `O1-D1`, `O1-D2`, ... for transport shipments
pub fn route_label(origin: usize, destination: usize) -> String {
    format!("O{}-D{}", origin + 1, destination + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(variable_label(0), "x1");
        assert_eq!(variable_label(9), "x10");
        assert_eq!(route_label(0, 2), "O1-D3");
    }

    #[test]
    fn test_solution_lookup() {
        let outcome = SolveOutcome::Optimal(Solution {
            labels: vec!["x1".to_string(), "x2".to_string()],
            values: vec![2.0, 6.0],
            objective_value: 36.0,
        });

        assert!(outcome.is_optimal());
        assert_eq!(outcome.status(), "OPTIMAL");
        let solution = outcome.solution().unwrap();
        assert_eq!(solution.value_of("x2"), Some(6.0));
        assert_eq!(solution.value_of("x3"), None);
        assert_eq!(solution.iter().count(), 2);

        assert_eq!(SolveOutcome::Infeasible.solution(), None);
        assert_eq!(SolveOutcome::Unbounded.status(), "UNBOUNDED");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(SolveOutcome::SolverError {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "solver_error");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(SolveOutcome::Infeasible).unwrap();
        assert_eq!(json["status"], "infeasible");
    }
}
