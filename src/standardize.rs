//! Weighted column standardization.
//!
//! Each comparison column is centered to zero mean and scaled to unit
//! variance (population standard deviation, matching the catalog build),
//! then multiplied by its importance weight. The weighted z-space is where
//! Euclidean distance is computed.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::table::COMPARE_DIMS;
use crate::transform::FeatureMatrix;

/// Variance below this is treated as degenerate.
const VARIANCE_EPS: f64 = 1e-12;

/// What to do when a column has (near-)zero variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Standardize the column to 0.0 for every row. A constant column
    /// carries no ordering information, so dropping its contribution leaves
    /// the ranking well-defined; the substitution is logged.
    #[default]
    Fallback,
    /// Fail the query with [`EngineError::DegenerateColumn`].
    Strict,
}

/// Standardize `matrix` in place and weight each column.
///
/// `weights` are the effective (damped) importance weights. The matrix is
/// request-scoped; the shared table is never touched.
pub fn standardize(
    matrix: &mut FeatureMatrix,
    weights: &[f64; COMPARE_DIMS],
    policy: DegeneratePolicy,
) -> Result<(), EngineError> {
    let n = matrix.len();
    if n == 0 {
        return Ok(());
    }

    for col in 0..COMPARE_DIMS {
        let mean = matrix.iter().map(|row| row[col]).sum::<f64>() / n as f64;
        let variance =
            matrix.iter().map(|row| (row[col] - mean).powi(2)).sum::<f64>() / n as f64;

        if variance < VARIANCE_EPS {
            match policy {
                DegeneratePolicy::Strict => {
                    return Err(EngineError::DegenerateColumn { column: col });
                }
                DegeneratePolicy::Fallback => {
                    tracing::debug!(column = col, "degenerate column standardized to zero");
                    for row in matrix.iter_mut() {
                        row[col] = 0.0;
                    }
                    continue;
                }
            }
        }

        let std = variance.sqrt();
        let weight = weights[col];
        for row in matrix.iter_mut() {
            row[col] = (row[col] - mean) / std * weight;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn column(matrix: &FeatureMatrix, col: usize) -> Vec<f64> {
        matrix.iter().map(|row| row[col]).collect()
    }

    #[test]
    fn zero_mean_unit_variance_then_weighted() {
        // Column 0 holds 1, 2, 3: mean 2, population std sqrt(2/3).
        let mut matrix = vec![
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [3.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let weights = [2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        standardize(&mut matrix, &weights, DegeneratePolicy::Fallback).unwrap();

        let std = (2.0_f64 / 3.0).sqrt();
        let expected = [-1.0 / std * 2.0, 0.0, 1.0 / std * 2.0];
        for (got, want) in column(&matrix, 0).iter().zip(expected.iter()) {
            assert!((got - want).abs() < EPS);
        }

        // Unweighted column keeps unit variance.
        let col1 = column(&matrix, 1);
        let var: f64 = col1.iter().map(|v| v * v).sum::<f64>() / 3.0;
        assert!((var - 1.0).abs() < EPS);
    }

    #[test]
    fn strict_policy_fails_on_constant_column() {
        let mut matrix = vec![
            [1.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let weights = [1.0; COMPARE_DIMS];
        let err = standardize(&mut matrix, &weights, DegeneratePolicy::Strict).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateColumn { column: 1 }));
    }

    #[test]
    fn fallback_policy_zeroes_constant_column() {
        let mut matrix = vec![
            [1.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let weights = [1.0; COMPARE_DIMS];
        standardize(&mut matrix, &weights, DegeneratePolicy::Fallback).unwrap();

        assert_eq!(column(&matrix, 1), vec![0.0, 0.0]);
        // The varying column is still standardized.
        assert!((column(&matrix, 0)[0] + 1.0).abs() < EPS);
        assert!((column(&matrix, 0)[1] - 1.0).abs() < EPS);
    }

    #[test]
    fn empty_matrix_is_a_no_op() {
        let mut matrix: FeatureMatrix = Vec::new();
        standardize(&mut matrix, &[1.0; COMPARE_DIMS], DegeneratePolicy::Strict).unwrap();
        assert!(matrix.is_empty());
    }
}
