//! Row-major layout shared by transport canonicalization and result reshaping.
//!
//! Shipment `(origin, destination)` is variable `origin * destinations + destination`.
//! Both directions go through [`flat_index`]; nothing else computes that offset.

use crate::canonical::ModelError;
use crate::model::TransportProblem;

/// Balance tolerance for supply and demand totals
const BALANCE_TOLERANCE: f64 = 1e-9;

/// Flat variable index of the shipment from `origin` to `destination`
pub fn flat_index(origin: usize, destination: usize, destinations: usize) -> usize {
    origin * destinations + destination
}

/// Inverse of [`flat_index`]
pub fn split_index(index: usize, destinations: usize) -> (usize, usize) {
    (index / destinations, index % destinations)
}

/// Flatten a rectangular matrix in variable order
pub fn flatten(matrix: &[Vec<f64>]) -> Vec<f64> {
    let destinations = matrix.first().map_or(0, Vec::len);
    let mut flat = vec![0.0; matrix.len() * destinations];
    for (i, row) in matrix.iter().enumerate() {
        for (j, &v) in row.iter().enumerate().take(destinations) {
            flat[flat_index(i, j, destinations)] = v;
        }
    }
    flat
}

/// Rebuild the `origins x destinations` matrix from a flat vector
pub fn reshape(flat: &[f64], origins: usize, destinations: usize) -> Result<Vec<Vec<f64>>, ModelError> {
    if flat.len() != origins * destinations {
        return Err(ModelError::DimensionMismatch {
            context: format!("flat solution for {}x{} shipments", origins, destinations),
            expected: origins * destinations,
            found: flat.len(),
        });
    }
    Ok((0..origins)
        .map(|i| {
            (0..destinations)
                .map(|j| flat[flat_index(i, j, destinations)])
                .collect()
        })
        .collect())
}

/// Total supply against total demand
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    pub total_supply: f64,
    pub total_demand: f64,
}

impl Balance {
    pub fn is_balanced(&self) -> bool {
        let scale = self.total_supply.abs().max(self.total_demand.abs()).max(1.0);
        (self.total_supply - self.total_demand).abs() <= BALANCE_TOLERANCE * scale
    }
}

impl TransportProblem {
    pub fn balance(&self) -> Balance {
        Balance {
            total_supply: self.supply.iter().sum(),
            total_demand: self.demand.iter().sum(),
        }
    }

    /// Reject a problem whose totals differ. Canonicalization does not call
    /// this; an unbalanced problem simply solves as infeasible.
    pub fn check_balance(&self) -> Result<(), ModelError> {
        let balance = self.balance();
        if balance.is_balanced() {
            Ok(())
        } else {
            Err(ModelError::Unbalanced {
                supply: balance.total_supply,
                demand: balance.total_demand,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_reshape_round_trip() {
        for origins in 1..=5 {
            for destinations in 1..=5 {
                let matrix: Vec<Vec<f64>> = (0..origins)
                    .map(|i| (0..destinations).map(|j| (i * 10 + j) as f64).collect())
                    .collect();

                let flat = flatten(&matrix);
                for i in 0..origins {
                    for j in 0..destinations {
                        assert_eq!(flat[i * destinations + j], matrix[i][j]);
                    }
                }
                assert_eq!(reshape(&flat, origins, destinations).unwrap(), matrix);
            }
        }
    }

    #[test]
    fn test_split_inverts_flat_index() {
        let destinations = 4;
        for index in 0..12 {
            let (i, j) = split_index(index, destinations);
            assert_eq!(flat_index(i, j, destinations), index);
        }
        assert_eq!(split_index(6, 4), (1, 2));
    }

    #[test]
    fn test_reshape_length_mismatch() {
        let err = reshape(&[1.0, 2.0, 3.0], 2, 2).unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                context: "flat solution for 2x2 shipments".to_string(),
                expected: 4,
                found: 3,
            }
        );
    }

    #[test]
    fn test_balance() {
        let balanced = TransportProblem::new(
            vec![vec![0.0; 3]; 3],
            vec![20.0, 30.0, 25.0],
            vec![10.0, 25.0, 40.0],
        );
        assert!(balanced.balance().is_balanced());
        assert!(balanced.check_balance().is_ok());

        let unbalanced = TransportProblem::new(vec![vec![0.0; 3]; 2], vec![10.0, 10.0], vec![5.0, 5.0, 50.0]);
        assert_eq!(
            unbalanced.check_balance(),
            Err(ModelError::Unbalanced {
                supply: 20.0,
                demand: 60.0,
            })
        );
    }
}
