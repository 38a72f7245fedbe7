//! Query result types.
//!
//! Result rows carry the raw catalog attributes, not the transformed ones:
//! callers see star ratings and BPMs as players know them, while the pipeline
//! keeps its rescaled copies to itself.

use serde::Serialize;

use crate::mods::Mods;
use crate::table::FeatureRow;

/// Outcome of a similarity query.
///
/// An unknown `(map_id, mods)` pair is a normal outcome, not an error: the
/// catalog simply has no entry for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    Found { results: Vec<ResultRow> },
    NotFound,
}

/// One ranked neighbor, ready for display or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub map_id: i64,
    pub mods: Mods,
    pub star_rating: f64,
    pub bpm: f64,
    pub size: f64,
    pub approach_rate: f64,
    pub drain: f64,
    pub accuracy: f64,
    /// Similarity score, rounded to two decimals. 100.00 means identical
    /// comparison attributes; large distances can push it negative.
    pub similarity: f64,
}

impl ResultRow {
    /// Shape a ranked table row for output.
    pub fn from_row(row: &FeatureRow, similarity: f64) -> Self {
        Self {
            map_id: row.map_id,
            mods: row.mods,
            star_rating: row.star_rating,
            bpm: row.bpm,
            size: row.size,
            approach_rate: row.approach_rate,
            drain: row.drain_param,
            accuracy: row.accuracy_param,
            similarity,
        }
    }
}
