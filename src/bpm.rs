//! BPM octave-equivalence resolution.
//!
//! A map at 90 BPM mapped in 1/4 rhythms feels like one at 180 BPM in 1/2, so
//! raw tempo is a poor comparison axis. Each candidate BPM is snapped to
//! whichever binary multiple lands closest to the query map's BPM before
//! standardization. Non-binary tempo relationships (e.g. 3:2) are not
//! modelled.

use crate::transform::FeatureMatrix;

/// Octave candidates, in tie-break order: on an exact tie the earliest
/// (smallest) factor wins, preferring the identity over a doubling.
pub const OCTAVE_FACTORS: [f64; 5] = [0.25, 0.5, 1.0, 2.0, 4.0];

/// Column index of BPM inside the comparison matrix.
const BPM_COL: usize = 1;

/// Snap every row's BPM to the octave closest to `query_bpm`, in place on a
/// request-scoped matrix.
pub fn normalize(matrix: &mut FeatureMatrix, query_bpm: f64) {
    for row in matrix.iter_mut() {
        row[BPM_COL] = snap(row[BPM_COL], query_bpm);
    }
}

/// The octave multiple of `bpm` closest to `query_bpm`.
pub fn snap(bpm: f64, query_bpm: f64) -> f64 {
    let mut best = bpm * OCTAVE_FACTORS[0];
    let mut best_delta = (best - query_bpm).abs();
    for &factor in &OCTAVE_FACTORS[1..] {
        let candidate = bpm * factor;
        let delta = (candidate - query_bpm).abs();
        // Strict comparison keeps the earliest factor on exact ties.
        if delta < best_delta {
            best = candidate;
            best_delta = delta;
        }
    }
    best
}
