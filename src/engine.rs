//! Query orchestration.
//!
//! The engine owns the shared table behind an [`ArcSwap`]: queries take a
//! snapshot with `load_full` and run the whole pipeline against it, while
//! reloads build a fresh table off to the side and publish it atomically.
//! A query that started before a reload finishes against the snapshot it
//! took; nothing is ever patched in place.
//!
//! Per-query pipeline, in order: transform (clip + rescale), BPM octave
//! normalization against the query row, weighted standardization, then
//! Euclidean ranking. Every stage works on a request-scoped matrix.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{QueryOutcome, ResultRow};
use crate::mods::Mods;
use crate::rank;
use crate::standardize::{self, DegeneratePolicy};
use crate::table::{FeatureTable, COMPARE_DIMS};
use crate::transform::TransformConfig;

/// Column index of BPM in the comparison matrix; the query row's transformed
/// BPM anchors octave normalization.
const BPM_COL: usize = 1;

/// Tunable engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-column importance weights, in comparison column order.
    pub weights: [f64; COMPARE_DIMS],
    /// Global damping applied to every weight, pulling the metric toward
    /// uniform importance.
    pub damping: f64,
    /// Distance-to-score falloff exponent.
    pub falloff: f64,
    pub transform: TransformConfig,
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: [1.2, 1.4, 0.6, 1.1, 0.4, 1.0, 2.2, 0.8],
            damping: 0.7,
            falloff: 1.35,
            transform: TransformConfig::default(),
            degenerate_policy: DegeneratePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// The damped weights actually used for standardization.
    pub fn effective_weights(&self) -> [f64; COMPARE_DIMS] {
        let mut weights = self.weights;
        for w in &mut weights {
            *w *= self.damping;
        }
        weights
    }
}

/// A similarity query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub map_id: i64,
    pub mods: Mods,
    /// Mod masks whose rows are dropped from the results.
    #[serde(default)]
    pub exclude_mods: HashSet<u32>,
    pub max_results: usize,
}

#[derive(Debug)]
pub struct SimilarityEngine {
    table: ArcSwap<FeatureTable>,
    config: EngineConfig,
}

impl SimilarityEngine {
    pub fn new(table: FeatureTable, config: EngineConfig) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            config,
        }
    }

    /// Load shards and build an engine over them.
    pub fn load(paths: &[PathBuf], config: EngineConfig) -> Result<Self> {
        let table = FeatureTable::load(paths)?;
        tracing::info!(rows = table.len(), shards = paths.len(), "table loaded");
        Ok(Self::new(table, config))
    }

    /// Rebuild the table from `paths` and publish it atomically.
    ///
    /// On any load error the previous table stays in place untouched.
    pub fn reload(&self, paths: &[PathBuf]) -> Result<()> {
        let table = FeatureTable::load(paths)?;
        tracing::info!(rows = table.len(), "table replaced");
        self.table.store(Arc::new(table));
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the current table.
    pub fn table(&self) -> Arc<FeatureTable> {
        self.table.load_full()
    }

    /// Run a similarity query end to end.
    ///
    /// An unknown `(map_id, mods)` pair yields [`QueryOutcome::NotFound`];
    /// `max_results == 0` is rejected before any work happens.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        if request.max_results == 0 {
            return Err(EngineError::InvalidArgument(
                "max_results must be positive".into(),
            ));
        }

        let start = Instant::now();
        let table = self.table.load_full();

        let Some(query_index) = table.locate(request.map_id, request.mods) else {
            tracing::debug!(map_id = request.map_id, mods = %request.mods, "query row not in table");
            return Ok(QueryOutcome::NotFound);
        };

        let mut matrix = self.config.transform.apply(&table);
        let query_bpm = matrix[query_index][BPM_COL];
        crate::bpm::normalize(&mut matrix, query_bpm);
        standardize::standardize(
            &mut matrix,
            &self.config.effective_weights(),
            self.config.degenerate_policy,
        )?;

        let mods: Vec<Mods> = table.rows().iter().map(|row| row.mods).collect();
        let ranked = rank::rank(
            &matrix,
            &mods,
            query_index,
            &request.exclude_mods,
            request.max_results,
            self.config.falloff,
        )?;

        let results: Vec<ResultRow> = ranked
            .iter()
            .map(|r| ResultRow::from_row(table.row(r.row_index), r.score))
            .collect();

        tracing::debug!(
            map_id = request.map_id,
            mods = %request.mods,
            results = results.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "query complete"
        );
        Ok(QueryOutcome::Found { results })
    }
}
