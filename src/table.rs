//! In-memory feature table.
//!
//! The table is built once from one or more .kft shards, concatenated in the
//! order given, and treated as immutable afterwards. Queries never mutate it;
//! every pipeline stage works on request-scoped copies.
//!
//! Shards are memory-mapped and their payload cast with `bytemuck`, so loading
//! is a single pass over page-cache-backed memory.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::EngineError;
use crate::format::{ShardError, ShardHeader, COLUMNS, HEADER_SIZE};
use crate::mods::Mods;

/// Number of attributes that take part in distance comparison
/// (star_rating through speed_object_ratio).
pub const COMPARE_DIMS: usize = 8;

/// One (map, mods) pair with its precomputed attributes.
///
/// The first eight fields are the comparison attributes, in shard column
/// order. `accuracy_param` and `drain_param` are carried for display only and
/// never enter the distance metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub star_rating: f64,
    pub bpm: f64,
    pub size: f64,
    pub approach_rate: f64,
    pub slider_factor: f64,
    pub circle_slider_ratio: f64,
    pub aim_speed_ratio: f64,
    pub speed_object_ratio: f64,
    pub map_id: i64,
    pub mods: Mods,
    pub accuracy_param: f64,
    pub drain_param: f64,
}

impl FeatureRow {
    /// Build a row from one shard row in fixed column order.
    pub fn from_columns(cols: &[f64]) -> Self {
        debug_assert_eq!(cols.len(), COLUMNS);
        Self {
            star_rating: cols[0],
            bpm: cols[1],
            size: cols[2],
            approach_rate: cols[3],
            slider_factor: cols[4],
            circle_slider_ratio: cols[5],
            aim_speed_ratio: cols[6],
            speed_object_ratio: cols[7],
            map_id: cols[8] as i64,
            mods: Mods(cols[9] as u32),
            accuracy_param: cols[10],
            drain_param: cols[11],
        }
    }

    /// Serialize back to shard column order.
    pub fn to_columns(&self) -> [f64; COLUMNS] {
        [
            self.star_rating,
            self.bpm,
            self.size,
            self.approach_rate,
            self.slider_factor,
            self.circle_slider_ratio,
            self.aim_speed_ratio,
            self.speed_object_ratio,
            self.map_id as f64,
            self.mods.bits() as f64,
            self.accuracy_param,
            self.drain_param,
        ]
    }

    /// The eight comparison attributes, in pipeline column order.
    #[inline]
    pub fn comparison(&self) -> [f64; COMPARE_DIMS] {
        [
            self.star_rating,
            self.bpm,
            self.size,
            self.approach_rate,
            self.slider_factor,
            self.circle_slider_ratio,
            self.aim_speed_ratio,
            self.speed_object_ratio,
        ]
    }

    /// True if every comparison attribute is finite.
    pub fn is_comparable(&self) -> bool {
        self.comparison().iter().all(|v| v.is_finite())
    }
}

/// The full catalog: an ordered, immutable sequence of feature rows with a
/// `(map_id, mod_mask)` lookup index.
#[derive(Debug)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    index: HashMap<(i64, u32), usize>,
}

impl FeatureTable {
    /// Load and concatenate shards in the given order.
    ///
    /// Any unreadable, truncated, or column-mismatched shard fails the whole
    /// load with [`EngineError::DataUnavailable`]. Rows with non-finite
    /// comparison attributes are dropped here so they can never reach the
    /// distance computation.
    pub fn load(paths: &[PathBuf]) -> Result<Self, EngineError> {
        let mut rows = Vec::new();
        for path in paths {
            let shard_rows =
                read_shard(path).map_err(|source| EngineError::DataUnavailable {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(shard = %path.display(), rows = shard_rows.len(), "loaded shard");
            rows.extend(shard_rows);
        }
        Self::from_rows(rows)
    }

    /// Build a table from in-memory rows, enforcing the table invariants:
    /// finite comparison attributes and unique `(map_id, mod_mask)` keys.
    pub fn from_rows(rows: Vec<FeatureRow>) -> Result<Self, EngineError> {
        let total = rows.len();
        let rows: Vec<FeatureRow> = rows.into_iter().filter(FeatureRow::is_comparable).collect();
        let dropped = total - rows.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped rows with non-finite comparison attributes");
        }

        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let key = (row.map_id, row.mods.bits());
            if index.insert(key, i).is_some() {
                return Err(EngineError::DuplicateRow {
                    map_id: row.map_id,
                    mods: row.mods.bits(),
                });
            }
        }

        Ok(Self { rows, index })
    }

    /// Index of the row for `(map_id, mods)`, if present.
    pub fn locate(&self, map_id: i64, mods: Mods) -> Option<usize> {
        self.index.get(&(map_id, mods.bits())).copied()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    #[inline]
    pub fn row(&self, index: usize) -> &FeatureRow {
        &self.rows[index]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read one shard into rows.
///
/// The payload starts at byte 16, which keeps f64 alignment on the
/// page-aligned mapping; `bytemuck` still verifies it.
fn read_shard(path: &Path) -> Result<Vec<FeatureRow>, ShardError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    let header = ShardHeader::from_bytes(&mmap)?;
    if header.columns as usize != COLUMNS {
        return Err(ShardError::ColumnMismatch {
            expected: COLUMNS,
            actual: header.columns as usize,
        });
    }

    let expected = header.file_size();
    if mmap.len() < expected {
        return Err(ShardError::Truncated {
            expected,
            actual: mmap.len(),
        });
    }

    let payload = &mmap[HEADER_SIZE..expected];
    let values: &[f64] = bytemuck::try_cast_slice(payload).map_err(|_| ShardError::Misaligned)?;

    Ok(values.chunks_exact(COLUMNS).map(FeatureRow::from_columns).collect())
}
