//! Nearest-neighbor ranking over the standardized matrix.
//!
//! Distances are Euclidean in the weighted z-space. Ordering is ascending by
//! distance with a stable sort, so exactly-equal distances keep table order
//! and two runs over the same table are bit-for-bit identical.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::error::EngineError;
use crate::mods::Mods;
use crate::table::COMPARE_DIMS;
use crate::transform::FeatureMatrix;

/// One ranked candidate: its table row index, raw distance, and score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedRow {
    pub row_index: usize,
    pub distance: f64,
    pub score: f64,
}

/// Euclidean distance between two comparison rows.
#[inline]
pub fn euclidean(a: &[f64; COMPARE_DIMS], b: &[f64; COMPARE_DIMS]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Convert a distance into a similarity score:
/// `round(100 · (1 − d^falloff), 2)`.
///
/// Not clamped: distances above 1 yield negative scores, which is valid
/// ordering information for far-away candidates, not an error.
#[inline]
pub fn score(distance: f64, falloff: f64) -> f64 {
    let raw = 100.0 * (1.0 - distance.powf(falloff));
    (raw * 100.0).round() / 100.0
}

/// Rank every row against the row at `query_index`.
///
/// The query row itself is always skipped, rows whose mod mask appears in
/// `exclude_mods` are filtered while walking, and rows with non-finite
/// distances are dropped from the candidate set entirely. Returns at most
/// `max_results` rows in ascending-distance (descending-score) order.
pub fn rank(
    matrix: &FeatureMatrix,
    mods: &[Mods],
    query_index: usize,
    exclude_mods: &HashSet<u32>,
    max_results: usize,
    falloff: f64,
) -> Result<Vec<RankedRow>, EngineError> {
    if max_results == 0 {
        return Err(EngineError::InvalidArgument(
            "max_results must be positive".into(),
        ));
    }
    debug_assert_eq!(matrix.len(), mods.len());

    let query = &matrix[query_index];
    let distances: Vec<f64> = matrix.par_iter().map(|row| euclidean(row, query)).collect();

    // Candidate indices in table order; the stable sort below preserves that
    // order across equal distances.
    let mut candidates: Vec<(usize, f64)> = distances
        .iter()
        .enumerate()
        .filter(|&(i, d)| i != query_index && d.is_finite())
        .map(|(i, &d)| (i, d))
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut results = Vec::with_capacity(max_results.min(candidates.len()));
    for (row_index, distance) in candidates {
        if exclude_mods.contains(&mods[row_index].bits()) {
            continue;
        }
        results.push(RankedRow {
            row_index,
            distance,
            score: score(distance, falloff),
        });
        if results.len() == max_results {
            break;
        }
    }

    Ok(results)
}
